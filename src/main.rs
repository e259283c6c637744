use chrono::{Days, Utc};
use form_catalog::scheduled_action;
use form_core::{LabelLookup, MapLookup, PropagationWarning, Resolution};
use formflow_rust::config::CONFIG;
use formflow_rust::{FormflowError, SubmitOutcome, WizardOptions};
use serde_json::{json, to_string_pretty};

fn labels() -> MapLookup {
    [("schedule.action", "Acción"),
     ("schedule.start_at", "Inicio"),
     ("schedule.repeat", "Repetir"),
     ("schedule.days", "Días"),
     ("schedule.end_type", "Termina"),
     ("schedule.end_value", "Fin"),
     ("capacity.cpu", "CPUs"),
     ("capacity.memory", "Memoria (GB)"),
     ("capacity.gpu_enabled", "GPU"),
     ("capacity.gpu_count", "Cantidad de GPUs"),
     ("capacity.local_disk", "Disco local (GB)"),
     ("capacity.labels", "Etiquetas")].into_iter()
                                       .collect()
}

fn print_resolution(title: &str, resolution: &Resolution, lookup: &dyn LabelLookup) {
    println!("[{title}] fingerprint={}", resolution.fingerprint);
    for f in resolution.rendered() {
        println!("  {:<28} {:<12} {:?}{}{}",
                 f.localized_label(lookup),
                 format!("{:?}", f.kind),
                 f.value,
                 if f.options.is_empty() { String::new() } else { format!(" options={}", f.options.len()) },
                 if f.read_only { " (solo lectura)" } else { "" });
    }
}

fn main() -> Result<(), FormflowError> {
    let lookup = labels();
    let tomorrow = Utc::now().date_naive()
                             .checked_add_days(Days::new(1))
                             .ok_or_else(|| FormflowError::Internal("fecha fuera de rango".into()))?;
    let entity = json!({
        "ACTION": "resize",
        "START_AT": tomorrow.format("%Y-%m-%d").to_string(),
        "REPEAT": "once",
        "resources": { "cpu": 4 },
        "legacy_field": "se descarta"
    });

    println!("[config] {}", to_string_pretty(&*CONFIG)?);
    let mut wizard = scheduled_action().options(WizardOptions::new().with_engine(CONFIG.engine))
                                       .policy(CONFIG.policy())
                                       .build(entity)?;
    println!("[wizard] id={} steps={:?}", wizard.id(), wizard.step_ids());
    if let Some(r) = wizard.current_resolution() {
        print_resolution("schedule", r, &lookup);
    }

    // Semanal: DAYS pasa a selección múltiple.
    let change = wizard.set_value("REPEAT", json!("weekly"))?;
    println!("[change] REPEAT=weekly changed={:?} passes={}",
             change.propagation.changed,
             change.propagation.passes);
    wizard.set_value("DAYS", json!([0, 2, 4]))?;
    wizard.set_value("END_TYPE", json!("count"))?;
    let change = wizard.set_value("END_VALUE", json!("10"))?;
    for w in change.propagation.warnings.iter() {
        if let PropagationWarning::LimitReached { passes, .. } = w {
            println!("[warn] propagación cortada tras {passes} pasadas");
        }
    }
    print_resolution("schedule", &change.resolution, &lookup);

    let validation = wizard.next()?;
    println!("[next] schedule valid={}", validation.is_valid());
    if let Some(r) = wizard.current_resolution() {
        print_resolution("capacity", r, &lookup);
    }
    wizard.set_value("labels", json!(["nightly", "batch"]))?;

    match wizard.submit()? {
        SubmitOutcome::Submitted { payload } => println!("[submit] payload={}", to_string_pretty(&payload)?),
        SubmitOutcome::Invalid { step_id, field_errors } => {
            println!("[submit] step '{step_id}' inválido: {}", to_string_pretty(&field_errors)?)
        }
    }
    for ev in wizard.events() {
        println!("[event] #{} {} {:?}", ev.seq, ev.ts.to_rfc3339(), ev.kind);
    }
    Ok(())
}
