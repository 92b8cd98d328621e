//! Subsystem health checks, aggregated into one report for an operator or
//! a `/health` endpoint the facade exposes.

use chrono::{DateTime, Utc};

/// Result of a single subsystem probe (a store ping, a sub-store's
/// migration status, a provider's last-known reachability).
#[derive(Debug, Clone)]
pub struct SubsystemCheck {
    pub name: String,
    pub healthy: bool,
    pub detail: String,
}

impl SubsystemCheck {
    pub fn ok(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            healthy: true,
            detail: detail.into(),
        }
    }

    pub fn unhealthy(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            healthy: false,
            detail: detail.into(),
        }
    }
}

/// Aggregate health of the memory engine: one check per store/provider plus
/// an overall verdict (healthy only if every check is).
#[derive(Debug, Clone)]
pub struct HealthReport {
    pub checks: Vec<SubsystemCheck>,
    pub overall_healthy: bool,
    pub generated_at: DateTime<Utc>,
}

impl HealthReport {
    pub fn from_checks(checks: Vec<SubsystemCheck>, now: DateTime<Utc>) -> Self {
        let overall_healthy = checks.iter().all(|c| c.healthy);
        Self {
            checks,
            overall_healthy,
            generated_at: now,
        }
    }

    pub fn unhealthy_checks(&self) -> impl Iterator<Item = &SubsystemCheck> {
        self.checks.iter().filter(|c| !c.healthy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_is_healthy_only_when_every_check_is() {
        let report = HealthReport::from_checks(
            vec![SubsystemCheck::ok("main_store", "reachable"), SubsystemCheck::ok("llm", "reachable")],
            Utc::now(),
        );
        assert!(report.overall_healthy);
        assert_eq!(report.unhealthy_checks().count(), 0);
    }

    #[test]
    fn a_single_unhealthy_check_fails_the_whole_report() {
        let report = HealthReport::from_checks(
            vec![
                SubsystemCheck::ok("main_store", "reachable"),
                SubsystemCheck::unhealthy("working_substore", "migration failed"),
            ],
            Utc::now(),
        );
        assert!(!report.overall_healthy);
        assert_eq!(report.unhealthy_checks().count(), 1);
    }
}
