//! Browsing past quiz attempts: search, status tabs, pagination and totals.

use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

use quiz_core::model::{AttemptStatus, QuizAttempt};
use storage::repository::{AttemptRepository, count_by_status};

use crate::error::HistoryError;

/// Rows per history page.
pub const PAGE_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryTab {
    #[default]
    All,
    Finished,
    Unfinished,
}

impl HistoryTab {
    #[must_use]
    pub fn matches(self, status: AttemptStatus) -> bool {
        match self {
            Self::All => true,
            Self::Finished => status == AttemptStatus::Finished,
            Self::Unfinished => status == AttemptStatus::Unfinished,
        }
    }
}

impl FromStr for HistoryTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "finished" => Ok(Self::Finished),
            "unfinished" => Ok(Self::Unfinished),
            other => Err(format!("unknown history tab: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub search: String,
    pub tab: HistoryTab,
    /// 1-based.
    pub page: u32,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            tab: HistoryTab::All,
            page: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPage {
    pub items: Vec<QuizAttempt>,
    pub page: u32,
    pub total_pages: u32,
    pub total_items: usize,
}

/// Headline numbers over the whole history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HistoryOverview {
    pub attempts: usize,
    pub finished: usize,
    pub unfinished: usize,
    pub average_score: Option<u8>,
    pub best_score: Option<u8>,
}

impl HistoryOverview {
    fn from_attempts(attempts: &[QuizAttempt]) -> Self {
        let finished: Vec<u8> = attempts
            .iter()
            .filter(|a| a.status() == AttemptStatus::Finished)
            .map(QuizAttempt::score)
            .collect();
        let average_score = if finished.is_empty() {
            None
        } else {
            let sum: usize = finished.iter().map(|&s| usize::from(s)).sum();
            let n = finished.len();
            u8::try_from((2 * sum + n) / (2 * n)).ok()
        };

        Self {
            attempts: attempts.len(),
            finished: count_by_status(attempts, AttemptStatus::Finished),
            unfinished: count_by_status(attempts, AttemptStatus::Unfinished),
            average_score,
            best_score: finished.iter().copied().max(),
        }
    }
}

#[derive(Clone)]
pub struct HistoryService {
    attempts: Arc<dyn AttemptRepository>,
}

impl HistoryService {
    #[must_use]
    pub fn new(attempts: Arc<dyn AttemptRepository>) -> Self {
        Self { attempts }
    }

    /// One page of attempts, newest first, filtered by tab and search text.
    ///
    /// An empty result is returned as page 1 of 0.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::PageOutOfRange` for page 0 or a page past the end,
    /// or `HistoryError::Storage` if the repository fails.
    pub async fn list(&self, query: &HistoryQuery) -> Result<HistoryPage, HistoryError> {
        let matching: Vec<QuizAttempt> = self
            .attempts
            .list_attempts(u32::MAX)
            .await?
            .into_iter()
            .filter(|a| query.tab.matches(a.status()) && a.matches_search(&query.search))
            .collect();

        let total_items = matching.len();
        let total_pages = u32::try_from(total_items.div_ceil(PAGE_SIZE)).unwrap_or(u32::MAX);
        if query.page == 0 || (total_pages > 0 && query.page > total_pages) {
            return Err(HistoryError::PageOutOfRange {
                page: query.page,
                total_pages,
            });
        }

        let skip = usize::try_from(query.page - 1).unwrap_or(usize::MAX).saturating_mul(PAGE_SIZE);
        let items: Vec<QuizAttempt> = matching.into_iter().skip(skip).take(PAGE_SIZE).collect();
        tracing::debug!(
            tab = ?query.tab,
            search = %query.search,
            page = query.page,
            total_items,
            "history page listed"
        );

        Ok(HistoryPage {
            items,
            page: query.page,
            total_pages,
            total_items,
        })
    }

    /// # Errors
    ///
    /// Returns `HistoryError::Storage` if the repository fails.
    pub async fn overview(&self) -> Result<HistoryOverview, HistoryError> {
        let attempts = self.attempts.list_attempts(u32::MAX).await?;
        Ok(HistoryOverview::from_attempts(&attempts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{AttemptId, QuizId};
    use quiz_core::time::fixed_now;
    use storage::InMemoryRepository;
    use storage::sample::sample_repository;

    fn service() -> HistoryService {
        HistoryService::new(Arc::new(sample_repository().unwrap()))
    }

    fn attempt(id: u64, days: i64, status: AttemptStatus, score: u8) -> QuizAttempt {
        QuizAttempt::from_persisted(
            AttemptId::new(id),
            QuizId::new(format!("q{id}")).unwrap(),
            format!("Quiz {id}"),
            "General",
            fixed_now() + chrono::Duration::days(days),
            status,
            score,
            10,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn lists_newest_first() {
        let page = service().list(&HistoryQuery::default()).await.unwrap();
        assert_eq!(page.total_items, 5);
        assert_eq!(page.total_pages, 1);
        let titles: Vec<&str> = page.items.iter().map(QuizAttempt::title).collect();
        assert_eq!(
            titles,
            [
                "English Literature",
                "Physics: Mechanics",
                "World History: WWII",
                "Organic Chemistry Basics",
                "Calculus Midterm",
            ]
        );
    }

    #[tokio::test]
    async fn filters_by_tab_and_search() {
        let svc = service();
        let finished = svc
            .list(&HistoryQuery {
                tab: HistoryTab::Finished,
                ..HistoryQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(finished.total_items, 3);

        let search = svc
            .list(&HistoryQuery {
                search: "CHEM".into(),
                ..HistoryQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(search.items.len(), 1);
        assert_eq!(search.items[0].subject(), "Chemistry");

        let none = svc
            .list(&HistoryQuery {
                search: "history".into(),
                tab: HistoryTab::Unfinished,
                page: 1,
            })
            .await
            .unwrap();
        assert_eq!(none.total_items, 0);
        assert_eq!(none.total_pages, 0);
    }

    #[tokio::test]
    async fn paginates_five_per_page() {
        let rows = (1..=7).map(|i| attempt(i, i as i64, AttemptStatus::Finished, 70));
        let svc = HistoryService::new(Arc::new(InMemoryRepository::new().with_attempts(rows)));

        let second = svc
            .list(&HistoryQuery {
                page: 2,
                ..HistoryQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(second.total_pages, 2);
        assert_eq!(second.items.len(), 2);
        assert_eq!(second.items[0].id(), AttemptId::new(2));

        let err = svc
            .list(&HistoryQuery {
                page: 3,
                ..HistoryQuery::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HistoryError::PageOutOfRange {
                page: 3,
                total_pages: 2
            }
        ));
        assert!(
            svc.list(&HistoryQuery {
                page: 0,
                ..HistoryQuery::default()
            })
            .await
            .is_err()
        );
    }

    #[tokio::test]
    async fn overview_counts_and_scores() {
        let overview = service().overview().await.unwrap();
        assert_eq!(overview.attempts, 5);
        assert_eq!(overview.finished, 3);
        assert_eq!(overview.unfinished, 2);
        // (85 + 92 + 78) / 3 = 85
        assert_eq!(overview.average_score, Some(85));
        assert_eq!(overview.best_score, Some(92));
    }

    #[tokio::test]
    async fn overview_of_empty_history() {
        let svc = HistoryService::new(Arc::new(InMemoryRepository::new()));
        let overview = svc.overview().await.unwrap();
        assert_eq!(overview.attempts, 0);
        assert_eq!(overview.average_score, None);
        assert_eq!(overview.best_score, None);
    }

    #[test]
    fn tab_parsing() {
        assert_eq!("Finished".parse::<HistoryTab>().unwrap(), HistoryTab::Finished);
        assert!("done".parse::<HistoryTab>().is_err());
    }
}
