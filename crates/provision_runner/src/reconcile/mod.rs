//! Reconcile Module - Pure Functions für die Plan-Berechnung
//!
//! Jede Funktion hier vergleicht Soll- und Ist-Zustand und leitet daraus
//! Actions ab. Alles ist eine **pure function**:
//! - Keine Side Effects
//! - Deterministisch
//! - Testbar ohne Mocks
//!
//! Die Aufrufer sind dafür verantwortlich, den Ist-Zustand unmittelbar
//! vorher frisch zu erheben und die Actions danach auszuführen.

mod actions;

pub use actions::{Action, ActionPlan};

use std::collections::HashSet;

use crate::state::{DatabaseState, DesiredResource, DesiredSecret, ObservedPackages};

/// Berechnet die minimale Installationsliste.
///
/// Ein Paket landet auf der Liste genau dann, wenn es nicht installiert
/// ist. Jede vorhandene Version zählt als erfüllt - es gibt bewusst
/// keinen Versionsvergleich und keinen Upgrade-Pfad.
pub fn diff_packages(desired: &[String], observed: &ObservedPackages) -> Vec<String> {
    let mut seen = HashSet::new();
    desired
        .iter()
        .filter(|name| seen.insert(name.as_str()))
        .filter(|name| !observed.contains(name.as_str()))
        .cloned()
        .collect()
}

/// Leitet die Paket-Action ab: ein Batch-Install oder ein Skip.
pub fn plan_packages(desired: &[String], observed: &ObservedPackages) -> Action {
    let missing = diff_packages(desired, observed);

    if missing.is_empty() {
        Action::skip(
            "packages",
            format!("all {} package(s) already installed", desired.len()),
        )
    } else {
        Action::Install { packages: missing }
    }
}

/// Leitet die Resource-Action ab: Clone wenn das Ziel fehlt, sonst Pull.
pub fn plan_resource(resource: &DesiredResource, present: bool) -> Action {
    if present {
        Action::Pull {
            name: resource.name.clone(),
            dest: resource.dest.clone(),
        }
    } else {
        Action::Clone {
            name: resource.name.clone(),
            source: resource.source.clone(),
            dest: resource.dest.clone(),
        }
    }
}

/// Leitet die Secret-Action ab: Generate wenn der Pfad fehlt, sonst Skip.
///
/// Ein existierendes Artefakt wird nie neu generiert - alles was mit dem
/// alten Wert signiert wurde, würde sonst stillschweigend ungültig.
pub fn plan_secret(secret: &DesiredSecret, exists: bool) -> Action {
    if exists {
        Action::skip(secret.name.clone(), "already present, reusing")
    } else {
        Action::Generate {
            name: secret.name.clone(),
            path: secret.path.clone(),
        }
    }
}

/// Die Entscheidung für eine einzelne Dump-Datei.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpPlan {
    /// Datenbank existiert und ist leer - importieren
    Import,
    /// Datenbank enthält bereits Tabellen - niemals überschreiben
    Skip { tables: u64 },
    /// Datenbank existiert nicht - der Importer legt keine an
    MissingDatabase,
}

/// Leitet die Dump-Entscheidung aus dem Datenbank-Zustand ab.
///
/// Datensicherheit schlägt Aktualität: sobald eine Datenbank Tabellen
/// enthält, wird der Dump übersprungen, egal wie neu er ist.
pub fn plan_dump(state: &DatabaseState) -> DumpPlan {
    match state {
        DatabaseState::Missing => DumpPlan::MissingDatabase,
        DatabaseState::Tables(0) => DumpPlan::Import,
        DatabaseState::Tables(n) => DumpPlan::Skip { tables: *n },
    }
}
