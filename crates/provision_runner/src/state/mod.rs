//! State Module - Soll- und Ist-Zustand des Hosts
//!
//! Der DesiredState wird einmal pro Lauf aus der Config gebaut, der
//! ObservedState wird pro Stage frisch vom Host abgefragt und danach
//! verworfen. Nichts davon überlebt eine Mutation.

mod desired;
mod observed;

pub use desired::{DesiredResource, DesiredSecret, DesiredState, NetworkGateSettings, SecretRecipe};
pub use observed::{DatabaseState, ObservedPackages};
