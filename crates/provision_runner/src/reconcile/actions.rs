//! Actions - Die vom Reconciler abgeleiteten Arbeitseinheiten
//!
//! Eine Action beschreibt genau eine Mutation (oder einen expliziten
//! Skip). Skip ist ein vollwertiges Ergebnis, kein Fehler.

use std::path::PathBuf;

/// Eine Aktion die der Executor ausführen soll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Fehlende Pakete in einem einzigen Batch installieren
    Install {
        /// Installationsliste in gewünschter Reihenfolge, ohne Duplikate
        packages: Vec<String>,
    },

    /// Artefakt vollständig holen (Ziel existiert noch nicht)
    Clone {
        name: String,
        source: String,
        dest: PathBuf,
    },

    /// Existierendes Artefakt inkrementell aktualisieren
    Pull { name: String, dest: PathBuf },

    /// Secret generieren (Pfad existiert noch nicht)
    Generate { name: String, path: PathBuf },

    /// Dump in eine leere, existierende Datenbank importieren
    Import { database: String, file: PathBuf },

    /// Soll-Zustand bereits erreicht - bewusst nichts tun
    Skip { target: String, reason: String },
}

impl Action {
    pub fn skip(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Skip {
            target: target.into(),
            reason: reason.into(),
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skip { .. })
    }

    /// Prüft ob die Action den Host verändert.
    pub fn mutates(&self) -> bool {
        !self.is_skip()
    }

    /// Das betroffene Ziel (für Logging und Reports).
    pub fn target(&self) -> &str {
        match self {
            Self::Install { .. } => "packages",
            Self::Clone { name, .. } => name,
            Self::Pull { name, .. } => name,
            Self::Generate { name, .. } => name,
            Self::Import { database, .. } => database,
            Self::Skip { target, .. } => target,
        }
    }
}

/// Der berechnete Plan: eine geordnete Liste von Actions.
///
/// Der Plan wird pro Lauf frisch berechnet und sofort konsumiert,
/// nichts davon wird persistiert.
#[derive(Debug, Clone, Default)]
pub struct ActionPlan {
    actions: Vec<Action>,
}

impl ActionPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Action> {
        self.actions.iter()
    }

    pub fn into_vec(self) -> Vec<Action> {
        self.actions
    }

    /// Prüft ob der Plan ausschließlich aus Skips besteht.
    ///
    /// Das ist das Idempotenz-Kriterium: ein zweiter Lauf gegen einen
    /// unveränderten Host muss hier true liefern.
    pub fn all_skips(&self) -> bool {
        self.actions.iter().all(Action::is_skip)
    }

    /// Anzahl der Actions die den Host verändern würden.
    pub fn mutation_count(&self) -> usize {
        self.actions.iter().filter(|a| a.mutates()).count()
    }
}

impl From<Vec<Action>> for ActionPlan {
    fn from(actions: Vec<Action>) -> Self {
        Self { actions }
    }
}

impl IntoIterator for ActionPlan {
    type Item = Action;
    type IntoIter = std::vec::IntoIter<Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_is_not_a_mutation() {
        let action = Action::skip("orders", "database already holds 3 table(s)");

        assert!(action.is_skip());
        assert!(!action.mutates());
        assert_eq!(action.target(), "orders");
    }

    #[test]
    fn test_install_mutates() {
        let action = Action::Install {
            packages: vec!["nginx".to_string()],
        };

        assert!(action.mutates());
        assert_eq!(action.target(), "packages");
    }

    #[test]
    fn test_action_targets() {
        let clone = Action::Clone {
            name: "wp-cli".to_string(),
            source: "https://example.com/wp-cli.git".to_string(),
            dest: PathBuf::from("/opt/wp-cli"),
        };
        let pull = Action::Pull {
            name: "wordpress".to_string(),
            dest: PathBuf::from("/var/www/wordpress"),
        };
        let generate = Action::Generate {
            name: "tls-key".to_string(),
            path: PathBuf::from("/etc/ssl/private/dev.key"),
        };
        let import = Action::Import {
            database: "my-app".to_string(),
            file: PathBuf::from("/srv/dumps/my-app.sql"),
        };

        assert_eq!(clone.target(), "wp-cli");
        assert_eq!(pull.target(), "wordpress");
        assert_eq!(generate.target(), "tls-key");
        assert_eq!(import.target(), "my-app");
    }

    #[test]
    fn test_action_plan_basic() {
        let mut plan = ActionPlan::new();
        assert!(plan.is_empty());

        plan.push(Action::skip("packages", "all packages already installed"));
        assert_eq!(plan.len(), 1);
        assert!(!plan.is_empty());
    }

    #[test]
    fn test_all_skips() {
        let mut plan = ActionPlan::new();
        plan.push(Action::skip("packages", "all packages already installed"));
        plan.push(Action::skip("tls-key", "already present, reusing"));
        assert!(plan.all_skips());

        plan.push(Action::Install {
            packages: vec!["curl".to_string()],
        });
        assert!(!plan.all_skips());
    }

    #[test]
    fn test_mutation_count() {
        let plan = ActionPlan::from(vec![
            Action::skip("packages", "all packages already installed"),
            Action::Generate {
                name: "tls-key".to_string(),
                path: PathBuf::from("/etc/ssl/private/dev.key"),
            },
            Action::Pull {
                name: "wordpress".to_string(),
                dest: PathBuf::from("/var/www/wordpress"),
            },
        ]);

        assert_eq!(plan.mutation_count(), 2);
    }
}
