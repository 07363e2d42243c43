// ── Smart-home controller ──
//
// Room→device tree with SSE state patching, a bulk-edit mode, and bulk
// mutations with partial-failure reporting. Two producers mutate the same
// snapshot concurrently: the SSE stream patches individual devices in
// place, the fallback poller replaces the snapshot wholesale. An event
// landing after a replace simply patches the new snapshot — at most one
// missed transition per entity, which the next event or poll repairs.

use std::collections::BTreeSet;
use std::time::Duration;

use serde_json::Value;

use opsdeck_api::types::{
    BulkResult, ControlAction, DeviceCategory, DeviceDomain, Room, SmartDevice,
    SmartHomeDashboard,
};

use super::Notice;

const BULK_FEEDBACK_TTL: Duration = Duration::from_secs(6);

/// State of the smart-home view.
pub struct SmartHomeController {
    pub dashboard: Option<SmartHomeDashboard>,
    pub rooms: Vec<Room>,
    pub edit_mode: bool,
    /// Selected device ids while edit mode is on.
    pub selection: BTreeSet<i64>,
    /// Collapsed room ids — client-only UI state, never sent anywhere.
    pub collapsed: BTreeSet<i64>,
    generation: u64,
}

impl Default for SmartHomeController {
    fn default() -> Self {
        Self::new()
    }
}

impl SmartHomeController {
    pub fn new() -> Self {
        Self {
            dashboard: None,
            rooms: Vec::new(),
            edit_mode: false,
            selection: BTreeSet::new(),
            collapsed: BTreeSet::new(),
            generation: 0,
        }
    }

    // ── Snapshot lifecycle ───────────────────────────────────────────

    pub fn begin_reload(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Replace the whole snapshot. Selection survives a routine refresh,
    /// pruned to ids that still exist.
    pub fn apply_dashboard(&mut self, token: u64, dashboard: SmartHomeDashboard) -> bool {
        if token != self.generation {
            return false;
        }

        let live_ids: BTreeSet<i64> = dashboard
            .rooms
            .iter()
            .flat_map(|r| r.devices.iter())
            .chain(dashboard.unassigned.iter())
            .map(|d| d.id)
            .collect();
        self.selection.retain(|id| live_ids.contains(id));

        self.dashboard = Some(dashboard);
        true
    }

    pub fn apply_rooms(&mut self, rooms: Vec<Room>) {
        self.rooms = rooms;
    }

    /// Patch every device whose `entity_id` matches, replacing only the
    /// cached state and attributes. No reorder, no regroup — the device
    /// count, room assignment, and visibility are untouched. Returns how
    /// many records were patched.
    pub fn apply_state_changed(&mut self, entity_id: &str, state: &str, attributes: &Value) -> usize {
        let Some(dashboard) = self.dashboard.as_mut() else {
            return 0;
        };

        let mut patched = 0;
        let devices = dashboard
            .rooms
            .iter_mut()
            .flat_map(|r| r.devices.iter_mut())
            .chain(dashboard.unassigned.iter_mut());

        for device in devices {
            if device.entity_id == entity_id {
                device.last_state = Some(state.to_owned());
                device.last_attributes = Some(attributes.clone());
                patched += 1;
            }
        }

        patched
    }

    /// Empty-state rule: with zero registered devices the view shows the
    /// discovery prompt instead of the room list, even if rooms exist.
    pub fn show_empty_state(&self) -> bool {
        self.dashboard
            .as_ref()
            .is_some_and(|d| d.total_devices == 0)
    }

    // ── Client-only UI state ─────────────────────────────────────────

    pub fn toggle_room_collapsed(&mut self, room_id: i64) {
        if !self.collapsed.remove(&room_id) {
            self.collapsed.insert(room_id);
        }
    }

    // ── Edit mode & selection ────────────────────────────────────────

    /// Entering and exiting edit mode both clear the selection.
    pub fn set_edit_mode(&mut self, on: bool) {
        if self.edit_mode != on {
            self.edit_mode = on;
            self.selection.clear();
        }
    }

    pub fn toggle_edit_mode(&mut self) {
        let next = !self.edit_mode;
        self.set_edit_mode(next);
    }

    pub fn toggle_selected(&mut self, device_id: i64) {
        if !self.edit_mode {
            return;
        }
        if !self.selection.remove(&device_id) {
            self.selection.insert(device_id);
        }
    }

    /// The Bulk Action Bar appears iff edit mode is on and something is
    /// selected.
    pub fn bulk_bar_visible(&self) -> bool {
        self.edit_mode && !self.selection.is_empty()
    }

    pub fn selected_ids(&self) -> Vec<i64> {
        self.selection.iter().copied().collect()
    }

    /// Confirmation prompt for bulk delete, quoting the count.
    pub fn delete_prompt(&self) -> String {
        format!("Delete {} devices? This cannot be undone.", self.selection.len())
    }

    /// Any bulk request completing — even a partial failure — clears the
    /// selection and triggers a dashboard reload. Edit mode stays on.
    /// Returns the feedback notice.
    pub fn bulk_completed(&mut self, result: &BulkResult) -> Notice {
        self.selection.clear();

        if result.failed > 0 {
            Notice::warning(
                format!("{} devices updated, {} failed", result.updated, result.failed),
                BULK_FEEDBACK_TTL,
            )
        } else {
            Notice::success(
                format!("{} devices updated", result.updated),
                BULK_FEEDBACK_TTL,
            )
        }
    }

    // ── Device actions ───────────────────────────────────────────────

    /// Control action for a tap outside edit mode. Locks map to
    /// lock/unlock by current state; every other controllable domain
    /// toggles. Non-controllable domains get nothing. The UI never
    /// updates optimistically — the next SSE event or fallback poll is
    /// the source of truth.
    pub fn control_action_for(device: &SmartDevice) -> Option<ControlAction> {
        if !device.domain.is_controllable() {
            return None;
        }

        if device.domain == DeviceDomain::Lock {
            if device.last_state.as_deref() == Some("locked") {
                Some(ControlAction::Unlock)
            } else {
                Some(ControlAction::Lock)
            }
        } else {
            Some(ControlAction::Toggle)
        }
    }

    /// Category auto-assigned at import time when none is given
    /// explicitly.
    pub fn auto_category(domain: DeviceDomain) -> DeviceCategory {
        match domain {
            DeviceDomain::Sensor => DeviceCategory::Sensor,
            DeviceDomain::BinarySensor | DeviceDomain::Lock => DeviceCategory::Security,
            DeviceDomain::Light => DeviceCategory::Lighting,
            DeviceDomain::Climate | DeviceDomain::Fan => DeviceCategory::Climate,
            DeviceDomain::MediaPlayer => DeviceCategory::Media,
            DeviceDomain::Switch | DeviceDomain::Cover | DeviceDomain::Other => {
                DeviceCategory::General
            }
        }
    }

    /// All devices in render order: rooms first, then unassigned.
    pub fn devices(&self) -> impl Iterator<Item = &SmartDevice> {
        self.dashboard.iter().flat_map(|d| {
            d.rooms
                .iter()
                .flat_map(|r| r.devices.iter())
                .chain(d.unassigned.iter())
        })
    }

    pub fn total_devices(&self) -> i64 {
        self.dashboard.as_ref().map_or(0, |d| d.total_devices)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use opsdeck_api::types::RoomGroup;

    use super::*;
    use crate::controller::NoticeLevel;

    fn device(id: i64, room_id: Option<i64>, entity_id: &str, domain: DeviceDomain) -> SmartDevice {
        SmartDevice {
            id,
            room_id,
            integration_config_id: 1,
            entity_id: entity_id.into(),
            friendly_name: entity_id.into(),
            domain,
            device_class: None,
            category: DeviceCategory::General,
            last_state: Some("22.1".into()),
            last_attributes: None,
            is_visible: true,
            is_favorited: false,
        }
    }

    fn dashboard() -> SmartHomeDashboard {
        SmartHomeDashboard {
            rooms: vec![
                RoomGroup {
                    id: 1,
                    name: "Living room".into(),
                    icon: None,
                    devices: vec![
                        device(10, Some(1), "sensor.foo", DeviceDomain::Sensor),
                        device(11, Some(1), "light.sofa", DeviceDomain::Light),
                    ],
                },
                RoomGroup {
                    id: 2,
                    name: "Office".into(),
                    icon: None,
                    devices: vec![device(12, Some(2), "lock.door", DeviceDomain::Lock)],
                },
            ],
            unassigned: vec![device(13, None, "sensor.foo", DeviceDomain::Sensor)],
            total_devices: 4,
        }
    }

    fn loaded() -> SmartHomeController {
        let mut ctrl = SmartHomeController::new();
        let token = ctrl.begin_reload();
        ctrl.apply_dashboard(token, dashboard());
        ctrl
    }

    #[test]
    fn state_changed_patches_all_matching_entities() {
        let mut ctrl = loaded();
        let attrs = json!({ "unit_of_measurement": "°C" });

        let patched = ctrl.apply_state_changed("sensor.foo", "22.4", &attrs);
        // Matching devices exist in a room AND in unassigned.
        assert_eq!(patched, 2);

        for d in ctrl.devices().filter(|d| d.entity_id == "sensor.foo") {
            assert_eq!(d.last_state.as_deref(), Some("22.4"));
            assert_eq!(d.last_attributes.as_ref().unwrap()["unit_of_measurement"], "°C");
        }
    }

    #[test]
    fn state_changed_preserves_count_grouping_and_flags() {
        let mut ctrl = loaded();
        let before: Vec<(i64, Option<i64>, bool)> = ctrl
            .devices()
            .map(|d| (d.id, d.room_id, d.is_visible))
            .collect();

        ctrl.apply_state_changed("sensor.foo", "23.0", &Value::Null);

        let after: Vec<(i64, Option<i64>, bool)> = ctrl
            .devices()
            .map(|d| (d.id, d.room_id, d.is_visible))
            .collect();

        assert_eq!(before, after, "ids, rooms, visibility, and order unchanged");
        assert_eq!(ctrl.total_devices(), 4);
    }

    #[test]
    fn state_changed_is_idempotent() {
        let mut ctrl = loaded();
        let attrs = json!({ "unit_of_measurement": "°C" });

        ctrl.apply_state_changed("sensor.foo", "22.4", &attrs);
        let snapshot_once = ctrl.dashboard.clone();

        ctrl.apply_state_changed("sensor.foo", "22.4", &attrs);
        assert_eq!(ctrl.dashboard, snapshot_once);
    }

    #[test]
    fn state_changed_for_unknown_entity_is_noop() {
        let mut ctrl = loaded();
        assert_eq!(ctrl.apply_state_changed("light.nowhere", "on", &Value::Null), 0);
    }

    #[test]
    fn stale_dashboard_reload_is_discarded() {
        let mut ctrl = SmartHomeController::new();

        let older = ctrl.begin_reload();
        let newer = ctrl.begin_reload();

        assert!(ctrl.apply_dashboard(newer, dashboard()));

        let mut stale = dashboard();
        stale.total_devices = 99;
        assert!(!ctrl.apply_dashboard(older, stale));
        assert_eq!(ctrl.total_devices(), 4);
    }

    #[test]
    fn edit_mode_transitions_clear_selection() {
        let mut ctrl = loaded();

        ctrl.set_edit_mode(true);
        ctrl.toggle_selected(10);
        ctrl.toggle_selected(11);
        assert!(ctrl.bulk_bar_visible());

        ctrl.set_edit_mode(false);
        assert!(ctrl.selection.is_empty());
        assert!(!ctrl.bulk_bar_visible());

        // Re-entering starts clean too.
        ctrl.set_edit_mode(true);
        assert!(ctrl.selection.is_empty());
    }

    #[test]
    fn selection_requires_edit_mode() {
        let mut ctrl = loaded();
        ctrl.toggle_selected(10);
        assert!(ctrl.selection.is_empty());
    }

    #[test]
    fn bulk_completion_clears_selection_and_keeps_edit_mode() {
        let mut ctrl = loaded();
        ctrl.set_edit_mode(true);
        ctrl.toggle_selected(10);
        ctrl.toggle_selected(11);
        ctrl.toggle_selected(12);

        let notice = ctrl.bulk_completed(&BulkResult {
            updated: 2,
            failed: 1,
        });

        assert_eq!(notice.level, NoticeLevel::Warning);
        assert_eq!(notice.message, "2 devices updated, 1 failed");
        assert!(ctrl.selection.is_empty());
        assert!(ctrl.edit_mode, "edit mode stays on after a bulk request");
    }

    #[test]
    fn clean_bulk_completion_is_success() {
        let mut ctrl = loaded();
        ctrl.set_edit_mode(true);
        ctrl.toggle_selected(10);

        let notice = ctrl.bulk_completed(&BulkResult {
            updated: 1,
            failed: 0,
        });
        assert_eq!(notice.level, NoticeLevel::Success);
    }

    #[test]
    fn delete_prompt_quotes_count() {
        let mut ctrl = loaded();
        ctrl.set_edit_mode(true);
        ctrl.toggle_selected(10);
        ctrl.toggle_selected(12);

        assert_eq!(ctrl.delete_prompt(), "Delete 2 devices? This cannot be undone.");
    }

    #[test]
    fn lock_toggle_depends_on_current_state() {
        let mut locked = device(1, None, "lock.door", DeviceDomain::Lock);
        locked.last_state = Some("locked".into());
        assert_eq!(
            SmartHomeController::control_action_for(&locked),
            Some(ControlAction::Unlock)
        );

        let mut unlocked = locked.clone();
        unlocked.last_state = Some("unlocked".into());
        assert_eq!(
            SmartHomeController::control_action_for(&unlocked),
            Some(ControlAction::Lock)
        );

        // Unknown lock state still locks.
        let mut unknown = locked;
        unknown.last_state = None;
        assert_eq!(
            SmartHomeController::control_action_for(&unknown),
            Some(ControlAction::Lock)
        );
    }

    #[test]
    fn non_lock_domains_toggle_or_ignore() {
        let light = device(1, None, "light.sofa", DeviceDomain::Light);
        assert_eq!(
            SmartHomeController::control_action_for(&light),
            Some(ControlAction::Toggle)
        );

        let fan = device(2, None, "fan.ceiling", DeviceDomain::Fan);
        assert_eq!(
            SmartHomeController::control_action_for(&fan),
            Some(ControlAction::Toggle)
        );

        let sensor = device(3, None, "sensor.temp", DeviceDomain::Sensor);
        assert_eq!(SmartHomeController::control_action_for(&sensor), None);
    }

    #[test]
    fn category_auto_assignment_table() {
        use DeviceCategory as C;
        use DeviceDomain as D;

        let table = [
            (D::Sensor, C::Sensor),
            (D::BinarySensor, C::Security),
            (D::Light, C::Lighting),
            (D::Switch, C::General),
            (D::Climate, C::Climate),
            (D::Lock, C::Security),
            (D::Cover, C::General),
            (D::Fan, C::Climate),
            (D::MediaPlayer, C::Media),
        ];

        for (domain, expected) in table {
            assert_eq!(SmartHomeController::auto_category(domain), expected, "{domain:?}");
        }
    }

    #[test]
    fn empty_state_shows_discovery_prompt_even_with_rooms() {
        let mut ctrl = SmartHomeController::new();
        assert!(!ctrl.show_empty_state(), "no data yet — still loading");

        let token = ctrl.begin_reload();
        ctrl.apply_dashboard(
            token,
            SmartHomeDashboard {
                rooms: vec![RoomGroup {
                    id: 1,
                    name: "Living room".into(),
                    icon: None,
                    devices: Vec::new(),
                }],
                unassigned: Vec::new(),
                total_devices: 0,
            },
        );

        assert!(ctrl.show_empty_state());
    }

    #[test]
    fn reload_prunes_selection_to_live_ids() {
        let mut ctrl = loaded();
        ctrl.set_edit_mode(true);
        ctrl.toggle_selected(10);
        ctrl.toggle_selected(13);

        // Device 13 disappears server-side.
        let mut next = dashboard();
        next.unassigned.clear();
        next.total_devices = 3;

        let token = ctrl.begin_reload();
        ctrl.apply_dashboard(token, next);

        assert_eq!(ctrl.selected_ids(), vec![10]);
    }

    #[test]
    fn room_collapse_is_client_only_toggle() {
        let mut ctrl = loaded();
        ctrl.toggle_room_collapsed(1);
        assert!(ctrl.collapsed.contains(&1));
        ctrl.toggle_room_collapsed(1);
        assert!(!ctrl.collapsed.contains(&1));
    }

    #[test]
    fn state_patch_after_snapshot_replace_hits_new_snapshot() {
        let mut ctrl = loaded();

        // Poller replaces the snapshot while an SSE event is in flight.
        let token = ctrl.begin_reload();
        ctrl.apply_dashboard(token, dashboard());

        // The late event patches the replacement snapshot.
        let patched = ctrl.apply_state_changed("lock.door", "unlocked", &Value::Null);
        assert_eq!(patched, 1);
        let lock = ctrl.devices().find(|d| d.entity_id == "lock.door").unwrap();
        assert_eq!(lock.last_state.as_deref(), Some("unlocked"));
    }
}
