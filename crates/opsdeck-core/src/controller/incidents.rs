// ── Incident log controller ──
//
// Status-filtered timeline with lifecycle transitions. Severity coloring
// lives in the rendering layer; the controller owns filtering, validation,
// and the resolve transition.

use chrono::{DateTime, Utc};

use opsdeck_api::types::{Incident, IncidentPatch, IncidentStatus, NewIncident, Severity};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IncidentFilter {
    #[default]
    All,
    Active,
    Investigating,
    Resolved,
}

impl IncidentFilter {
    pub const ALL: [IncidentFilter; 4] = [
        Self::All,
        Self::Active,
        Self::Investigating,
        Self::Resolved,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Active => "Active",
            Self::Investigating => "Investigating",
            Self::Resolved => "Resolved",
        }
    }

    /// Query parameter for the list endpoint. `All` sends none.
    pub fn as_status(self) -> Option<IncidentStatus> {
        match self {
            Self::All => None,
            Self::Active => Some(IncidentStatus::Active),
            Self::Investigating => Some(IncidentStatus::Investigating),
            Self::Resolved => Some(IncidentStatus::Resolved),
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|&f| f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

/// State of the incident log view.
pub struct IncidentController {
    pub incidents: Vec<Incident>,
    pub filter: IncidentFilter,
    generation: u64,
}

impl Default for IncidentController {
    fn default() -> Self {
        Self::new()
    }
}

impl IncidentController {
    pub fn new() -> Self {
        Self {
            incidents: Vec::new(),
            filter: IncidentFilter::default(),
            generation: 0,
        }
    }

    pub fn begin_reload(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    pub fn apply_incidents(&mut self, token: u64, incidents: Vec<Incident>) -> bool {
        if token != self.generation {
            return false;
        }
        self.incidents = incidents;
        true
    }

    /// Change the status filter. Returns a fetch token for the new list.
    pub fn set_filter(&mut self, filter: IncidentFilter) -> u64 {
        self.filter = filter;
        self.begin_reload()
    }

    /// The one-click resolve transition. The client only sends the status;
    /// the server stamps `resolved_at`. Resolving an already-resolved
    /// incident is a no-op.
    pub fn resolve_patch(incident: &Incident) -> Option<IncidentPatch> {
        if incident.status == IncidentStatus::Resolved {
            return None;
        }
        Some(IncidentPatch {
            status: Some(IncidentStatus::Resolved),
            resolution: None,
        })
    }

    /// Validate a creation form. Title, severity, status, and start time
    /// are required; `resolved_at` is accepted only with status resolved.
    pub fn validate_new(
        title: &str,
        severity: Severity,
        status: IncidentStatus,
        started_at: DateTime<Utc>,
        resolved_at: Option<DateTime<Utc>>,
        description: Option<String>,
        resolution: Option<String>,
    ) -> Result<NewIncident, CoreError> {
        if title.trim().is_empty() {
            return Err(CoreError::validation("title is required"));
        }

        if resolved_at.is_some() && status != IncidentStatus::Resolved {
            return Err(CoreError::validation(
                "resolved_at is only accepted when status is resolved",
            ));
        }

        if let Some(resolved) = resolved_at {
            if resolved < started_at {
                return Err(CoreError::validation(
                    "resolved_at must not be before started_at",
                ));
            }
        }

        Ok(NewIncident {
            title: title.trim().to_owned(),
            description,
            severity,
            status,
            started_at,
            resolved_at,
            resolution,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::error::ErrorKind;

    fn incident(id: i64, status: IncidentStatus) -> Incident {
        Incident {
            id,
            title: "DB unreachable".into(),
            description: None,
            severity: Severity::High,
            status,
            started_at: Utc.with_ymd_and_hms(2024, 5, 1, 14, 0, 0).unwrap(),
            resolved_at: None,
            resolution: None,
        }
    }

    #[test]
    fn filter_maps_to_query_param() {
        assert_eq!(IncidentFilter::All.as_status(), None);
        assert_eq!(
            IncidentFilter::Active.as_status(),
            Some(IncidentStatus::Active)
        );
        assert_eq!(
            IncidentFilter::Resolved.as_status(),
            Some(IncidentStatus::Resolved)
        );
    }

    #[test]
    fn changing_filter_supersedes_inflight_reload() {
        let mut ctrl = IncidentController::new();

        let older = ctrl.begin_reload();
        let newer = ctrl.set_filter(IncidentFilter::Active);

        assert!(ctrl.apply_incidents(newer, vec![incident(1, IncidentStatus::Active)]));
        assert!(!ctrl.apply_incidents(older, vec![incident(2, IncidentStatus::Resolved)]));

        assert_eq!(ctrl.incidents.len(), 1);
        assert_eq!(ctrl.incidents[0].id, 1);
    }

    #[test]
    fn resolve_sends_status_only() {
        let patch = IncidentController::resolve_patch(&incident(1, IncidentStatus::Active)).unwrap();
        assert_eq!(patch.status, Some(IncidentStatus::Resolved));
        assert!(patch.resolution.is_none());
    }

    #[test]
    fn resolving_resolved_incident_is_noop() {
        assert!(IncidentController::resolve_patch(&incident(1, IncidentStatus::Resolved)).is_none());
    }

    #[test]
    fn creation_requires_title() {
        let err = IncidentController::validate_new(
            "  ",
            Severity::High,
            IncidentStatus::Active,
            Utc::now(),
            None,
            None,
            None,
        )
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn resolved_at_only_with_resolved_status() {
        let started = Utc.with_ymd_and_hms(2024, 5, 1, 14, 0, 0).unwrap();
        let resolved = Utc.with_ymd_and_hms(2024, 5, 1, 16, 0, 0).unwrap();

        let err = IncidentController::validate_new(
            "DB unreachable",
            Severity::High,
            IncidentStatus::Active,
            started,
            Some(resolved),
            None,
            None,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let ok = IncidentController::validate_new(
            "DB unreachable",
            Severity::High,
            IncidentStatus::Resolved,
            started,
            Some(resolved),
            None,
            Some("failover".into()),
        )
        .unwrap();
        assert_eq!(ok.resolved_at, Some(resolved));
    }

    #[test]
    fn resolved_before_started_is_rejected() {
        let started = Utc.with_ymd_and_hms(2024, 5, 1, 14, 0, 0).unwrap();
        let resolved = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        let err = IncidentController::validate_new(
            "DB unreachable",
            Severity::High,
            IncidentStatus::Resolved,
            started,
            Some(resolved),
            None,
            None,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
