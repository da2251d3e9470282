//! Resource Sync - clone-if-absent / update-if-present
//!
//! Für Artefakte mit lebendigem Upstream gilt "einmal holen, danach
//! verfolgen". Das Gegenstück ist der DumpImporter, bei dem lokale Daten
//! geschützt werden statt dem Upstream zu folgen.

use crate::reconcile::{plan_resource, Action};
use crate::state::DesiredResource;
use crate::{HostBackend, ProvisionUI, StageError, UpdateOutcome};

/// Ergebnis einer erfolgreichen Synchronisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Das Ziel fehlte und wurde vollständig geholt
    Cloned,
    /// Das Ziel existierte und wurde aktualisiert (ggf. ohne Änderung)
    Updated,
}

/// Synchronisiert ein einzelnes Artefakt.
///
/// Der Präsenz-Check läuft bei jedem Aufruf frisch über das Backend.
/// Ein Update das nicht sauber anwendbar ist, wird als SyncConflict
/// gemeldet - die lokale Kopie bleibt unangetastet.
pub async fn sync_resource<H: HostBackend, U: ProvisionUI>(
    host: &H,
    resource: &DesiredResource,
    ui: &mut U,
) -> Result<SyncOutcome, StageError> {
    let present = host.path_exists(&resource.dest).await;
    let action = plan_resource(resource, present);
    ui.on_action(&action);

    match action {
        Action::Clone { source, dest, .. } => {
            host.clone_resource(&source, &dest).await?;
            Ok(SyncOutcome::Cloned)
        }
        Action::Pull { dest, .. } => match host.update_resource(&dest).await? {
            UpdateOutcome::Clean => Ok(SyncOutcome::Updated),
            UpdateOutcome::Conflict(detail) => Err(StageError::SyncConflict {
                name: resource.name.clone(),
                detail,
            }),
        },
        _ => unreachable!("plan_resource yields Clone or Pull"),
    }
}
