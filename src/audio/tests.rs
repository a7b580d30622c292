use super::*;
use crate::error::PlayerError;
use crate::testing::FakeMedia;
use proptest::prelude::*;

#[test]
fn band_table_is_fixed_and_ordered() {
    let bands = flat_bands();
    assert_eq!(bands.len(), 10);
    assert_eq!(bands[0].frequency, 32.0);
    assert_eq!(bands[9].frequency, 16000.0);
    assert!(bands.windows(2).all(|w| w[0].frequency < w[1].frequency));
    assert_eq!(bands[5].label(), "1k");
    assert_eq!(bands[2].label(), "125");
}

#[test]
fn boundary_bands_shelve_and_interior_bands_peak() {
    assert_eq!(FilterShape::for_band(0, BAND_COUNT), FilterShape::LowShelf);
    assert_eq!(FilterShape::for_band(9, BAND_COUNT), FilterShape::HighShelf);
    for i in 1..9 {
        assert_eq!(FilterShape::for_band(i, BAND_COUNT), FilterShape::Peaking);
    }
}

#[test]
fn ensure_initialized_builds_one_chain() {
    let media = FakeMedia::detached(1);
    let mut manager = SignalGraphManager::new(1.0);
    assert!(!manager.is_initialized());
    assert!(!media.graph_port().is_bound());

    manager.ensure_initialized(&media).unwrap();
    let first = manager.graph().unwrap().binding().clone();
    manager.ensure_initialized(&media).unwrap();

    let graph = manager.graph().unwrap();
    assert_eq!(graph.stage_count(), BAND_COUNT);
    assert_eq!(graph.media(), MediaId(1));
    assert!(std::sync::Arc::ptr_eq(&first, graph.binding()));
    assert!(std::sync::Arc::ptr_eq(
        media.graph_port().binding().unwrap(),
        graph.binding()
    ));
}

#[test]
fn stages_follow_band_table() {
    let media = FakeMedia::detached(1);
    let mut manager = SignalGraphManager::new(1.4);
    let graph = manager.ensure_initialized(&media).unwrap();
    for (i, stage) in graph.stages().iter().enumerate() {
        assert_eq!(stage.frequency, BAND_FREQUENCIES[i]);
        assert_eq!(stage.shape, FilterShape::for_band(i, BAND_COUNT));
        assert_eq!(stage.q, 1.4);
    }
}

#[test]
fn binding_a_second_media_fails_fast() {
    let first = FakeMedia::detached(1);
    let second = FakeMedia::detached(2);
    let mut manager = SignalGraphManager::new(1.0);
    manager.ensure_initialized(&first).unwrap();

    let err = manager.ensure_initialized(&second).unwrap_err();
    assert!(matches!(
        err,
        PlayerError::GraphBindingConflict {
            bound: MediaId(1),
            requested: MediaId(2)
        }
    ));
    assert!(err.is_session_fatal());
    assert!(!second.graph_port().is_bound());
}

#[test]
fn media_port_cannot_be_rebound_by_another_graph() {
    let media = FakeMedia::detached(1);
    let alias = media.sharing_port_with(2);
    let mut a = SignalGraphManager::new(1.0);
    let mut b = SignalGraphManager::new(1.0);
    a.ensure_initialized(&media).unwrap();

    let err = b.ensure_initialized(&alias).unwrap_err();
    assert!(matches!(err, PlayerError::GraphBindingConflict { bound: MediaId(1), .. }));
    assert!(!b.is_initialized());
}

#[test]
fn gain_before_initialization_is_dropped() {
    let media = FakeMedia::detached(1);
    let mut manager = SignalGraphManager::new(1.0);

    assert!(!manager.set_band_gain(3, 6.0));
    assert_eq!(manager.bands()[3].gain_db, 0.0);

    manager.ensure_initialized(&media).unwrap();
    assert_eq!(manager.gains()[3], 0.0);
}

#[test]
fn gain_after_initialization_updates_graph_and_mirror() {
    let media = FakeMedia::detached(1);
    let mut manager = SignalGraphManager::new(1.0);
    manager.ensure_initialized(&media).unwrap();

    assert!(manager.set_band_gain(4, -3.5));
    assert_eq!(manager.bands()[4].gain_db, -3.5);
    assert_eq!(manager.gains()[4], -3.5);
    assert_eq!(media.graph_port().binding().unwrap().gains().get(4), -3.5);
}

#[test]
fn out_of_range_band_index_is_ignored() {
    let media = FakeMedia::detached(1);
    let mut manager = SignalGraphManager::new(1.0);
    manager.ensure_initialized(&media).unwrap();
    assert!(!manager.set_band_gain(BAND_COUNT, 3.0));
    assert_eq!(manager.gains(), [0.0; BAND_COUNT]);
}

#[test]
fn seeded_gains_become_initial_stage_gains() {
    let media = FakeMedia::detached(1);
    let mut seed = [0.0; BAND_COUNT];
    seed[0] = 4.0;
    seed[9] = 40.0;
    let mut manager = SignalGraphManager::with_gains(1.0, seed);
    manager.ensure_initialized(&media).unwrap();

    let live = media.graph_port().binding().unwrap().gains().snapshot();
    assert_eq!(live[0], 4.0);
    assert_eq!(live[9], MAX_GAIN_DB);
}

proptest! {
    #[test]
    fn stored_gain_is_always_in_range(index in 0usize..BAND_COUNT, gain in proptest::num::f32::ANY) {
        let media = FakeMedia::detached(1);
        let mut manager = SignalGraphManager::new(1.0);
        manager.ensure_initialized(&media).unwrap();
        manager.set_band_gain(index, gain);
        let stored = manager.gains()[index];
        prop_assert!((MIN_GAIN_DB..=MAX_GAIN_DB).contains(&stored));
        prop_assert_eq!(stored, manager.bands()[index].gain_db);
    }

    #[test]
    fn clamp_gain_is_identity_inside_range(gain in MIN_GAIN_DB..=MAX_GAIN_DB) {
        prop_assert_eq!(clamp_gain(gain), gain);
    }
}
