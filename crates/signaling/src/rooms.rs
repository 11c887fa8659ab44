//! Raum-Registry – Verwaltet Raum-Mitgliedschaften
//!
//! Welche Verbindung ist in welchem Raum? Diese Registry haelt den
//! ephemeren Zustand aller Raeume. Raeume entstehen beim ersten Beitritt
//! und verschwinden sobald das letzte Mitglied sie verlaesst – es gibt
//! keine Persistenz.
//!
//! Invariante: eine Verbindung ist Mitglied von hoechstens einem Raum.

use babelcall_core::types::{ConnectionId, RoomId};
use dashmap::DashMap;
use std::sync::Arc;

/// Verwaltet die Raum-Mitgliedschaft aller Verbindungen
///
/// Thread-safe via Arc + DashMap. Clone der Registry teilt den inneren
/// Zustand.
#[derive(Clone)]
pub struct RoomRegistry {
    inner: Arc<RoomRegistryInner>,
}

struct RoomRegistryInner {
    /// Verbindung -> aktueller Raum
    verbindungen: DashMap<ConnectionId, RoomId>,
    /// Raum -> Liste der Mitglieder
    raum_mitglieder: DashMap<RoomId, Vec<ConnectionId>>,
}

impl RoomRegistry {
    /// Erstellt eine neue leere Registry
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(RoomRegistryInner {
                verbindungen: DashMap::new(),
                raum_mitglieder: DashMap::new(),
            }),
        }
    }

    /// Fuegt eine Verbindung einem Raum hinzu
    ///
    /// Gibt den vorherigen Raum zurueck falls die Verbindung bereits
    /// Mitglied eines anderen Raums war (der Aufrufer migriert sie dann).
    /// Ein erneuter Beitritt zum selben Raum ist ein No-op.
    pub fn beitreten(&self, verbindung: ConnectionId, raum_id: RoomId) -> Option<RoomId> {
        let vorheriger = self.inner.verbindungen.get(&verbindung).map(|r| r.clone());

        if vorheriger.as_ref() == Some(&raum_id) {
            tracing::debug!(verbindung = %verbindung, raum = %raum_id, "Bereits im Raum");
            return None;
        }

        if let Some(ref alter) = vorheriger {
            self.aus_raum_entfernen_intern(&verbindung, alter);
        }

        self.inner
            .verbindungen
            .insert(verbindung, raum_id.clone());
        self.inner
            .raum_mitglieder
            .entry(raum_id.clone())
            .or_default()
            .push(verbindung);

        tracing::debug!(verbindung = %verbindung, raum = %raum_id, "Raum beigetreten");
        vorheriger
    }

    /// Entfernt eine Verbindung aus ihrem Raum
    ///
    /// Gibt den verlassenen Raum zurueck; `None` wenn die Verbindung in
    /// keinem Raum war. Leert sich der Raum dadurch, wird er verworfen.
    pub fn verlassen(&self, verbindung: &ConnectionId) -> Option<RoomId> {
        let (_, raum_id) = self.inner.verbindungen.remove(verbindung)?;
        self.aus_raum_entfernen_intern(verbindung, &raum_id);
        tracing::debug!(verbindung = %verbindung, raum = %raum_id, "Raum verlassen");
        Some(raum_id)
    }

    /// Gibt den aktuellen Raum einer Verbindung zurueck
    pub fn raum_von_verbindung(&self, verbindung: &ConnectionId) -> Option<RoomId> {
        self.inner.verbindungen.get(verbindung).map(|r| r.clone())
    }

    /// Gibt alle Mitglieder eines Raums zurueck
    pub fn mitglieder(&self, raum_id: &RoomId) -> Vec<ConnectionId> {
        self.inner
            .raum_mitglieder
            .get(raum_id)
            .map(|ids| ids.clone())
            .unwrap_or_default()
    }

    /// Prueft ob ein Raum existiert
    pub fn raum_existiert(&self, raum_id: &RoomId) -> bool {
        self.inner.raum_mitglieder.contains_key(raum_id)
    }

    /// Gibt die Anzahl existierender Raeume zurueck
    pub fn raum_anzahl(&self) -> usize {
        self.inner.raum_mitglieder.len()
    }

    // -----------------------------------------------------------------------
    // Interne Hilfsmethoden
    // -----------------------------------------------------------------------

    fn aus_raum_entfernen_intern(&self, verbindung: &ConnectionId, raum_id: &RoomId) {
        if let Some(mut ids) = self.inner.raum_mitglieder.get_mut(raum_id) {
            ids.retain(|id| id != verbindung);
            let ist_leer = ids.is_empty();
            drop(ids);
            if ist_leer {
                self.inner.raum_mitglieder.remove(raum_id);
                tracing::debug!(raum = %raum_id, "Leerer Raum verworfen");
            }
        }
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beitreten_und_verlassen() {
        let registry = RoomRegistry::neu();
        let verbindung = ConnectionId::new();
        let raum = RoomId::from("r1");

        registry.beitreten(verbindung, raum.clone());
        assert_eq!(registry.raum_von_verbindung(&verbindung), Some(raum.clone()));
        assert_eq!(registry.mitglieder(&raum).len(), 1);

        let verlassen = registry.verlassen(&verbindung);
        assert_eq!(verlassen, Some(raum.clone()));
        assert_eq!(registry.raum_von_verbindung(&verbindung), None);
        // Netto-Effekt: Zustand wie vor dem Beitritt
        assert!(!registry.raum_existiert(&raum));
        assert_eq!(registry.raum_anzahl(), 0);
    }

    #[test]
    fn raum_entsteht_lazy_und_verschwindet_leer() {
        let registry = RoomRegistry::neu();
        let raum = RoomId::from("lobby");
        assert!(!registry.raum_existiert(&raum));

        let a = ConnectionId::new();
        let b = ConnectionId::new();
        registry.beitreten(a, raum.clone());
        registry.beitreten(b, raum.clone());
        assert!(registry.raum_existiert(&raum));
        assert_eq!(registry.mitglieder(&raum).len(), 2);

        registry.verlassen(&a);
        assert!(registry.raum_existiert(&raum), "Raum mit Restmitglied bleibt");

        registry.verlassen(&b);
        assert!(!registry.raum_existiert(&raum), "Leerer Raum muss weg sein");
    }

    #[test]
    fn raumwechsel_entfernt_aus_altem_raum() {
        let registry = RoomRegistry::neu();
        let verbindung = ConnectionId::new();
        let raum_a = RoomId::from("a");
        let raum_b = RoomId::from("b");

        registry.beitreten(verbindung, raum_a.clone());
        let vorheriger = registry.beitreten(verbindung, raum_b.clone());

        assert_eq!(vorheriger, Some(raum_a.clone()));
        assert!(!registry.raum_existiert(&raum_a));
        assert_eq!(registry.raum_von_verbindung(&verbindung), Some(raum_b));
    }

    #[test]
    fn erneuter_beitritt_ist_noop() {
        let registry = RoomRegistry::neu();
        let verbindung = ConnectionId::new();
        let raum = RoomId::from("r1");

        registry.beitreten(verbindung, raum.clone());
        let vorheriger = registry.beitreten(verbindung, raum.clone());

        assert_eq!(vorheriger, None);
        assert_eq!(registry.mitglieder(&raum).len(), 1, "Kein Doppeleintrag");
    }

    #[test]
    fn verlassen_ohne_raum_ist_noop() {
        let registry = RoomRegistry::neu();
        let verbindung = ConnectionId::new();
        assert_eq!(registry.verlassen(&verbindung), None);
    }

    #[test]
    fn clone_teilt_inneren_state() {
        let r1 = RoomRegistry::neu();
        let r2 = r1.clone();
        let verbindung = ConnectionId::new();

        r1.beitreten(verbindung, RoomId::from("geteilt"));
        assert_eq!(r2.mitglieder(&RoomId::from("geteilt")).len(), 1);
    }
}
