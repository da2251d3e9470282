//! Secret Materializer - generate-if-absent
//!
//! Generierung ist nicht idempotent: ein neu generierter Key würde jedes
//! bereits ausgestellte Zertifikat stillschweigend entwerten. Deshalb
//! entscheidet allein die Existenz des Pfads, nie der Inhalt.

use crate::reconcile::{plan_secret, Action, ActionPlan};
use crate::state::DesiredSecret;
use crate::{HostBackend, ProvisionUI, StageError};

/// Ergebnis eines erfolgreichen ensure-Aufrufs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretOutcome {
    /// Das Artefakt existierte bereits - keinerlei I/O darüber hinaus
    Reused,
    /// Der Generator lief genau einmal
    Generated,
}

/// Stellt sicher dass ein einzelnes Secret existiert.
pub async fn ensure_secret<H: HostBackend, U: ProvisionUI>(
    host: &H,
    secret: &DesiredSecret,
    ui: &mut U,
) -> Result<SecretOutcome, StageError> {
    let mut outcomes = ensure_all(host, std::slice::from_ref(secret), ui).await?;
    Ok(outcomes.remove(0))
}

/// Materialisiert alle Secrets: erst planen, dann strikt in Reihenfolge
/// ausführen.
///
/// Die Reihenfolge ist Teil des Vertrags: der Zertifikats-Generator
/// konsumiert den unmittelbar davor materialisierten (oder bereits
/// vorhandenen) Key. Nach dem ersten Fehler wird abgebrochen, damit kein
/// Generator auf einem fehlenden Vorgänger aufsetzt.
///
/// Schlägt ein Generator fehl, wird ein eventuell halb geschriebenes
/// Artefakt entfernt bevor der Fehler gemeldet wird - sonst würde der
/// Existenz-Check beim nächsten Lauf ein kaputtes Secret als fertig werten.
pub async fn ensure_all<H: HostBackend, U: ProvisionUI>(
    host: &H,
    secrets: &[DesiredSecret],
    ui: &mut U,
) -> Result<Vec<SecretOutcome>, StageError> {
    let mut plan = ActionPlan::new();
    for secret in secrets {
        let exists = host.path_exists(&secret.path).await;
        plan.push(plan_secret(secret, exists));
    }

    let mut outcomes = Vec::with_capacity(plan.len());
    for (secret, action) in secrets.iter().zip(plan) {
        ui.on_action(&action);
        match action {
            Action::Skip { .. } => outcomes.push(SecretOutcome::Reused),
            Action::Generate { path, .. } => {
                if let Err(err) = host.generate_secret(&secret.recipe, &path).await {
                    let _ = host.remove_file(&path).await;
                    return Err(StageError::Generation {
                        name: secret.name.clone(),
                        detail: err.to_string(),
                    });
                }
                outcomes.push(SecretOutcome::Generated);
            }
            _ => unreachable!("plan_secret yields Generate or Skip"),
        }
    }
    Ok(outcomes)
}
