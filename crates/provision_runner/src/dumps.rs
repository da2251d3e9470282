//! Dump Importer - Importiert SQL-Dumps ohne lokale Daten zu überschreiben
//!
//! Der Dateistamm (ohne Endung) ist der Datenbankname, wortwörtlich
//! inklusive Bindestrichen und Groß/Kleinschreibung. Der Importer legt
//! niemals Datenbanken an und importiert nur in existierende, leere
//! Datenbanken. Fehler sind pro Datei isoliert.

use std::path::Path;

use crate::reconcile::{plan_dump, Action, DumpPlan};
use crate::{HostBackend, ProvisionUI, StageError};

/// Ergebnis für eine einzelne Dump-Datei.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpReport {
    pub database: String,
    pub outcome: DumpOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DumpOutcome {
    /// Dump wurde vollständig importiert
    Imported,
    /// Datenbank enthielt bereits Tabellen - Dump nicht angefasst
    Skipped { tables: u64 },
    /// Import nicht möglich (fehlende Datenbank, Probe- oder Importfehler)
    Failed { reason: String },
}

impl DumpOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Importiert alle Dumps eines Verzeichnisses.
///
/// Die Dateien werden für deterministische Läufe lexikalisch sortiert
/// abgearbeitet. Ein Fehler bei einer Datei stoppt die übrigen nicht.
/// Schlägt die Datenbank-Probe fehl, wird konservativ NICHT importiert -
/// ein Import in eine womöglich gefüllte Datenbank ist nie sicher.
pub async fn import_all<H: HostBackend, U: ProvisionUI>(
    host: &H,
    dump_dir: &Path,
    ui: &mut U,
) -> Result<Vec<DumpReport>, StageError> {
    let mut files = host
        .list_dump_files(dump_dir)
        .await
        .map_err(|err| StageError::Probe(err.to_string()))?;
    files.sort();

    let mut reports = Vec::with_capacity(files.len());

    for file in files {
        let database = match file.file_stem().and_then(|s| s.to_str()) {
            Some(stem) => stem.to_string(),
            None => {
                let report = DumpReport {
                    database: file.display().to_string(),
                    outcome: DumpOutcome::Failed {
                        reason: "file name is not valid UTF-8".to_string(),
                    },
                };
                ui.on_dump_outcome(&report);
                reports.push(report);
                continue;
            }
        };

        let outcome = match host.database_state(&database).await {
            Err(err) => DumpOutcome::Failed {
                reason: format!("probe failed: {err}"),
            },
            Ok(state) => match plan_dump(&state) {
                DumpPlan::MissingDatabase => DumpOutcome::Failed {
                    reason: "database must be pre-created".to_string(),
                },
                DumpPlan::Skip { tables } => {
                    ui.on_action(&Action::skip(
                        database.clone(),
                        format!("database already holds {tables} table(s)"),
                    ));
                    DumpOutcome::Skipped { tables }
                }
                DumpPlan::Import => {
                    ui.on_action(&Action::Import {
                        database: database.clone(),
                        file: file.clone(),
                    });
                    match host.import_dump(&database, &file).await {
                        Ok(()) => DumpOutcome::Imported,
                        Err(err) => DumpOutcome::Failed {
                            reason: err.to_string(),
                        },
                    }
                }
            },
        };

        let report = DumpReport { database, outcome };
        ui.on_dump_outcome(&report);
        reports.push(report);
    }

    Ok(reports)
}
