use crate::{
    error::{AppError, Result},
    models::{
        notification::{Notification, NotificationType},
        period::UpdatePeriod,
        preferences::LastCheck,
        project::{ProjectRecord, TaggedProject, UpdateType},
        tracking::TrackedProject,
    },
    services::{building_info::UpdateFeed, store::DataStore},
    utils::currency::convert_to_euros_with_rate,
};
use chrono::{NaiveDate, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Detects changes to a user's tracked projects and records notifications.
///
/// Both entry points swallow failures: callers get a count of notifications
/// created, and `0` whenever anything went wrong.
#[derive(Clone)]
pub struct ProjectUpdateService {
    store: Arc<dyn DataStore>,
    feed: Arc<dyn UpdateFeed>,
    gbp_to_eur_rate: f64,
}

impl ProjectUpdateService {
    pub fn new(store: Arc<dyn DataStore>, feed: Arc<dyn UpdateFeed>, gbp_to_eur_rate: f64) -> Self {
        Self {
            store,
            feed,
            gbp_to_eur_rate,
        }
    }

    /// Runs one check cycle for `user_id` over the user's preferred period.
    pub async fn check_for_project_updates(&self, user_id: &str) -> usize {
        match self.run_check(user_id).await {
            Ok(created) => created,
            Err(e) => {
                error!("Project update check failed for user {}: {}", user_id, e);
                0
            }
        }
    }

    /// Checks the explicit window `start..=end`, classifying each row by the
    /// change markers it carries.
    pub async fn updates_for_date_range(&self, user_id: &str, start: NaiveDate, end: NaiveDate) -> usize {
        match self.run_date_range_check(user_id, start, end).await {
            Ok(created) => created,
            Err(e) => {
                error!(
                    "Date-range update check {}..{} failed for user {}: {}",
                    start, end, user_id, e
                );
                0
            }
        }
    }

    async fn run_check(&self, user_id: &str) -> Result<usize> {
        let tracked = self.tracked_by_project(user_id).await?;
        if tracked.is_empty() {
            debug!("User {} tracks no projects, skipping update check", user_id);
            return Ok(0);
        }

        let period = self.check_period(user_id).await;
        self.initialise_watermark(user_id).await;

        if !self.feed.has_credentials() {
            warn!("BuildingInfo credentials missing, skipping update check for {}", user_id);
            return Ok(0);
        }

        let outcome = self.fetch_and_notify(user_id, &tracked, period).await;

        // The watermark does not window the next query, so it advances even
        // when the feed failed.
        self.touch_watermark(user_id).await;

        outcome
    }

    async fn fetch_and_notify(
        &self,
        user_id: &str,
        tracked: &HashMap<String, TrackedProject>,
        period: UpdatePeriod,
    ) -> Result<usize> {
        let (major, minor) = tokio::try_join!(
            self.feed.fetch_updates(UpdateType::Major, period),
            self.feed.fetch_updates(UpdateType::Minor, period),
        )?;

        let merged = merge_updates(major, minor);
        debug!(
            "Update feed for period {} returned {} distinct projects",
            period,
            merged.len()
        );

        let notifications = build_notifications(user_id, tracked, &merged, self.gbp_to_eur_rate);
        Ok(self.persist(notifications).await)
    }

    async fn run_date_range_check(&self, user_id: &str, start: NaiveDate, end: NaiveDate) -> Result<usize> {
        if start > end {
            return Err(AppError::validation("Start date must not be after end date"));
        }

        let tracked = self.tracked_by_project(user_id).await?;
        if tracked.is_empty() {
            return Ok(0);
        }

        if !self.feed.has_credentials() {
            warn!("BuildingInfo credentials missing, skipping date-range check for {}", user_id);
            return Ok(0);
        }

        let rows = self.feed.fetch_updates_between(start, end).await?;
        let mut seen = HashSet::new();
        let notifications = rows
            .iter()
            .filter(|row| seen.insert(row.planning_id.clone()))
            .filter_map(|row| {
                let tracked = tracked.get(&row.planning_id)?;
                let kind = classify_by_markers(row);
                let title = display_title(tracked, row);
                let message = self.message_for(kind, row, title);
                Some(Notification::new(user_id, &row.planning_id, title, message, kind))
            })
            .collect::<Vec<_>>();

        Ok(self.persist(notifications).await)
    }

    /// Writes each notification independently; failures are logged and
    /// excluded from the count.
    async fn persist(&self, notifications: Vec<Notification>) -> usize {
        let mut created = 0;
        for notification in &notifications {
            match self.store.insert_notification(notification).await {
                Ok(()) => created += 1,
                Err(e) => error!(
                    "Failed to store {:?} notification for project {}: {}",
                    notification.notification_type, notification.project_id, e
                ),
            }
        }
        if created > 0 {
            info!("Created {} project notifications", created);
        }
        created
    }

    async fn tracked_by_project(&self, user_id: &str) -> Result<HashMap<String, TrackedProject>> {
        let tracked = self.store.list_tracked_projects(user_id).await?;
        Ok(tracked
            .into_iter()
            .map(|project| (project.project_id.clone(), project))
            .collect())
    }

    async fn check_period(&self, user_id: &str) -> UpdatePeriod {
        match self.store.get_preferences(user_id).await {
            Ok(Some(preferences)) => preferences.check_period,
            Ok(None) => UpdatePeriod::default(),
            Err(e) => {
                warn!("Could not read preferences for {}: {}", user_id, e);
                UpdatePeriod::default()
            }
        }
    }

    async fn initialise_watermark(&self, user_id: &str) {
        match self.store.get_last_check(user_id).await {
            Ok(Some(last)) => debug!("Last update check for {} at {}", user_id, last.timestamp),
            Ok(None) => {
                info!("First update check for user {}", user_id);
                self.touch_watermark(user_id).await;
            }
            Err(e) => warn!("Could not read last check for {}: {}", user_id, e),
        }
    }

    async fn touch_watermark(&self, user_id: &str) {
        let last_check = LastCheck {
            user_id: user_id.to_string(),
            timestamp: Utc::now(),
        };
        if let Err(e) = self.store.put_last_check(&last_check).await {
            warn!("Failed to update last check for {}: {}", user_id, e);
        }
    }

    fn message_for(&self, kind: NotificationType, row: &ProjectRecord, title: &str) -> String {
        match kind {
            NotificationType::StatusChange => match row.planning_stage.as_deref() {
                Some(stage) => format!("Project status changed to: {}", stage),
                None => format!("The status of '{}' has changed", title),
            },
            NotificationType::ValueChange => match row.planning_value.as_deref() {
                Some(value) => format!(
                    "Project value updated to: {}",
                    convert_to_euros_with_rate(value, self.gbp_to_eur_rate)
                ),
                None => format!("The value of '{}' has changed", title),
            },
            NotificationType::DocumentUpdate => {
                format!("New documents are available for '{}'", title)
            }
            NotificationType::ProjectUpdate => format!("Project '{}' has been updated", title),
        }
    }
}

/// Combines both feeds into one list keyed by `planning_id`. Major entries
/// come first and win when a project appears in both.
pub fn merge_updates(major: Vec<ProjectRecord>, minor: Vec<ProjectRecord>) -> Vec<TaggedProject> {
    let mut seen = HashSet::new();
    major
        .into_iter()
        .map(|record| (record, UpdateType::Major))
        .chain(minor.into_iter().map(|record| (record, UpdateType::Minor)))
        .filter(|(record, _)| seen.insert(record.planning_id.clone()))
        .map(|(record, update_type)| TaggedProject { record, update_type })
        .collect()
}

/// Notifications for every merged project the user tracks: a major update
/// yields a status change (stage present) and/or a value change (value
/// present); a minor update yields one general update.
pub fn build_notifications(
    user_id: &str,
    tracked: &HashMap<String, TrackedProject>,
    merged: &[TaggedProject],
    gbp_to_eur_rate: f64,
) -> Vec<Notification> {
    let mut notifications = Vec::new();

    for update in merged {
        let record = &update.record;
        let Some(tracked_project) = tracked.get(&record.planning_id) else {
            continue;
        };
        let title = display_title(tracked_project, record);

        match update.update_type {
            UpdateType::Major => {
                if let Some(stage) = record.planning_stage.as_deref() {
                    notifications.push(Notification::new(
                        user_id,
                        &record.planning_id,
                        title,
                        format!("Project status changed to: {}", stage),
                        NotificationType::StatusChange,
                    ));
                }
                if let Some(value) = record.planning_value.as_deref() {
                    notifications.push(Notification::new(
                        user_id,
                        &record.planning_id,
                        title,
                        format!(
                            "Project value updated to: {}",
                            convert_to_euros_with_rate(value, gbp_to_eur_rate)
                        ),
                        NotificationType::ValueChange,
                    ));
                }
            }
            UpdateType::Minor => notifications.push(Notification::new(
                user_id,
                &record.planning_id,
                title,
                format!("Project '{}' has been updated", title),
                NotificationType::ProjectUpdate,
            )),
        }
    }

    notifications
}

/// Change kind from the marker fields on a date-range row.
pub fn classify_by_markers(record: &ProjectRecord) -> NotificationType {
    if record.has_flag("_updated") {
        NotificationType::StatusChange
    } else if record.has_flag("_value_updated") {
        NotificationType::ValueChange
    } else if record.has_flag("_documents_updated") {
        NotificationType::DocumentUpdate
    } else {
        NotificationType::ProjectUpdate
    }
}

fn display_title<'a>(tracked: &'a TrackedProject, record: &'a ProjectRecord) -> &'a str {
    if tracked.title.trim().is_empty() {
        record.title()
    } else {
        &tracked.title
    }
}
