//! Step de programación de acciones recurrentes.
//!
//! - `REPEAT` decide el tipo de `DAYS` (días de la semana o intervalo en horas).
//! - `END_TYPE` decide la regla de `END_VALUE` (descartado, contador o fecha).

use chrono::{NaiveDate, NaiveTime};
use form_core::{ConfigurationError, Discriminated, FieldDescriptor, InputKind, Rule, SelectOption};
use form_wizard::{Step, StepContext};
use serde_json::{json, Value};

pub const STEP_ID: &str = "schedule";

fn repeat_options() -> Vec<SelectOption> {
    vec![SelectOption::new("repeat.once", "once"),
         SelectOption::new("repeat.hourly", "hourly"),
         SelectOption::new("repeat.daily", "daily"),
         SelectOption::new("repeat.weekly", "weekly")]
}

fn weekdays() -> Vec<SelectOption> {
    ["mon", "tue", "wed", "thu", "fri", "sat", "sun"].iter()
                                                     .enumerate()
                                                     .map(|(i, d)| SelectOption::new(format!("weekday.{d}"), i))
                                                     .collect()
}

fn end_type_options() -> Vec<SelectOption> {
    vec![SelectOption::new("end.never", "never"),
         SelectOption::new("end.count", "count"),
         SelectOption::new("end.date", "date")]
}

/// `2024-05-01` -> `2024-05-01T00:00:00Z`; fechas-hora se dejan igual.
fn start_of_day(v: &Value) -> Result<Option<Value>, String> {
    let Some(s) = v.as_str() else { return Ok(Some(v.clone())) };
    match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        Ok(date) => Ok(Some(json!(date.and_time(NaiveTime::MIN).and_utc().to_rfc3339()))),
        Err(_) => Ok(Some(v.clone())),
    }
}

pub fn fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("ACTION").label("schedule.action")
                                      .kind(InputKind::Select)
                                      .options(vec![SelectOption::new("action.start", "start"),
                                                    SelectOption::new("action.stop", "stop"),
                                                    SelectOption::new("action.resize", "resize")])
                                      .rule(Rule::one_of(["start", "stop", "resize"]).required()),
        FieldDescriptor::new("START_AT").label("schedule.start_at")
                                        .kind(InputKind::Date)
                                        .rule(Rule::date().required())
                                        .transform(start_of_day),
        FieldDescriptor::new("REPEAT").label("schedule.repeat")
                                      .kind(InputKind::Select)
                                      .options(repeat_options())
                                      .default_value(json!("once"))
                                      .rule(Rule::one_of(["once", "hourly", "daily", "weekly"])),
        FieldDescriptor::new("DAYS").label("schedule.days")
                                    .depends_on(["REPEAT"])
                                    .visible_when(|d| matches!(d.str("REPEAT"), Some("hourly" | "weekly")))
                                    .kind_with(|d| match d.str("REPEAT") {
                                        Some("weekly") => InputKind::MultiSelect,
                                        _ => InputKind::Number,
                                    })
                                    .options_with(|d| if d.str("REPEAT") == Some("weekly") { weekdays() } else { vec![] })
                                    .watch(|d, ctx| {
                                        // el valor anterior no sirve para el nuevo tipo
                                        let weekly = d.str("REPEAT") == Some("weekly");
                                        let is_list = ctx.current.is_some_and(Value::is_array);
                                        match (weekly, ctx.current) {
                                            (true, Some(_)) if !is_list => Ok(Some(json!([]))),
                                            (false, Some(_)) if is_list => Ok(Some(Value::Null)),
                                            _ => Ok(None),
                                        }
                                    })
                                    .validator(Discriminated::on("REPEAT").branch("weekly",
                                                                                  Rule::list(Some(Rule::integer().min(0.0).max(6.0))).min_items(1)
                                                                                                                                     .required())
                                                                          .branch("hourly", Rule::integer().min(1.0).max(24.0).required())
                                                                          .otherwise(Rule::strip())),
        FieldDescriptor::new("END_TYPE").label("schedule.end_type")
                                        .depends_on(["REPEAT"])
                                        .visible_when(|d| d.str("REPEAT") != Some("once"))
                                        .kind(InputKind::Select)
                                        .options(end_type_options())
                                        .default_value(json!("never"))
                                        .rule(Rule::one_of(["never", "count", "date"])),
        FieldDescriptor::new("END_VALUE").label("schedule.end_value")
                                         .depends_on(["REPEAT", "END_TYPE"])
                                         .visible_when(|d| {
                                             d.str("REPEAT") != Some("once") && d.str("END_TYPE").is_some_and(|t| t != "never")
                                         })
                                         .kind_with(|d| if d.str("END_TYPE") == Some("date") { InputKind::Date } else { InputKind::Number })
                                         .validator(Discriminated::on("END_TYPE").branch("never", Rule::strip())
                                                                                 .branch("count", Rule::integer().min(1.0).required())
                                                                                 .branch("date", Rule::date().required())),
    ]
}

/// Fábrica del step; exporta la acción elegida en la entidad.
pub fn step(ctx: &StepContext<'_>) -> Result<Step, ConfigurationError> {
    let action = ctx.entity.get("ACTION").cloned().unwrap_or(Value::Null);
    Ok(Step::new(STEP_ID, fields()).title("schedule.title")
                                   .exports(json!({ "action": action })))
}
