//! Run report: what changed, per source.

use gamesphere_sources::Source;

use crate::diff::DiffPlan;

/// One changed or carried title, as shown in the run summary.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportedTitle {
    pub identity: String,
    pub name: String,
}

/// Changes attributed to one source.
#[derive(Debug, Default, Clone)]
pub struct SourceChanges {
    pub added: Vec<ReportedTitle>,
    pub removed: Vec<ReportedTitle>,
    pub kept: Vec<ReportedTitle>,
}

/// Full outcome of a reconciliation run.
#[derive(Debug, Clone)]
pub struct ReconciliationResult {
    pub steam: SourceChanges,
    pub epic: SourceChanges,
    pub xbox: SourceChanges,
    pub custom: SourceChanges,
    /// True when the run was a dry run and nothing was written.
    pub dry_run: bool,
}

impl ReconciliationResult {
    /// Builds the report from a computed plan.
    pub fn from_plan(plan: &DiffPlan, dry_run: bool) -> Self {
        let mut result = Self {
            steam: SourceChanges::default(),
            epic: SourceChanges::default(),
            xbox: SourceChanges::default(),
            custom: SourceChanges::default(),
            dry_run,
        };

        for title in &plan.added {
            result.changes_mut(title.source).added.push(ReportedTitle {
                identity: title.identity.clone(),
                name: title.display_name.clone(),
            });
        }
        for entry in &plan.removed {
            result.changes_mut(entry.source).removed.push(ReportedTitle {
                identity: entry.identity.clone(),
                name: entry.app.name.clone(),
            });
        }
        for entry in &plan.kept {
            result.changes_mut(entry.source).kept.push(ReportedTitle {
                identity: entry.identity.clone(),
                name: entry.app.name.clone(),
            });
        }

        result
    }

    pub fn changes(&self, source: Source) -> &SourceChanges {
        match source {
            Source::Steam => &self.steam,
            Source::Epic => &self.epic,
            Source::Xbox => &self.xbox,
            Source::Custom => &self.custom,
        }
    }

    fn changes_mut(&mut self, source: Source) -> &mut SourceChanges {
        match source {
            Source::Steam => &mut self.steam,
            Source::Epic => &mut self.epic,
            Source::Xbox => &mut self.xbox,
            Source::Custom => &mut self.custom,
        }
    }

    pub fn total_added(&self) -> usize {
        Source::all().iter().map(|s| self.changes(*s).added.len()).sum()
    }

    pub fn total_removed(&self) -> usize {
        Source::all().iter().map(|s| self.changes(*s).removed.len()).sum()
    }

    pub fn total_kept(&self) -> usize {
        Source::all().iter().map(|s| self.changes(*s).kept.len()).sum()
    }

    /// True when the configuration was (or would be) left untouched.
    pub fn no_changes(&self) -> bool {
        self.total_added() == 0 && self.total_removed() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::OwnedEntry;
    use gamesphere_sources::InstalledTitle;
    use gamesphere_store::ConfiguredApp;

    #[test]
    fn report_attributes_changes_per_source() {
        let plan = DiffPlan {
            opaque: vec![],
            kept: vec![OwnedEntry {
                app: ConfiguredApp::new("Kept", "steam://rungameid/100", ""),
                source: Source::Steam,
                identity: "100".into(),
            }],
            removed: vec![OwnedEntry {
                app: ConfiguredApp::new("Old", "com.epicgames.launcher://apps/Old?x", ""),
                source: Source::Epic,
                identity: "Old".into(),
            }],
            added: vec![InstalledTitle {
                source: Source::Custom,
                identity: "/bin/tool".into(),
                display_name: "Tool".into(),
                exe_path: None,
                image_hint: None,
            }],
        };

        let report = ReconciliationResult::from_plan(&plan, false);
        assert_eq!(report.steam.kept.len(), 1);
        assert_eq!(report.epic.removed.len(), 1);
        assert_eq!(report.custom.added[0].name, "Tool");
        assert_eq!(report.total_added(), 1);
        assert_eq!(report.total_removed(), 1);
        assert_eq!(report.total_kept(), 1);
        assert!(!report.no_changes());
    }

    #[test]
    fn empty_plan_reports_no_changes() {
        let report = ReconciliationResult::from_plan(&DiffPlan::default(), true);
        assert!(report.no_changes());
        assert!(report.dry_run);
    }
}
