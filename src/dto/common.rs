use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::dto::game::GameListItem;

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 100;

/// Pagination parameters (`page` starts at 1).
#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Page number, 1-based.
    #[validate(range(min = 1))]
    pub page: Option<usize>,
    /// Page size, at most 100.
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<usize>,
}

impl PageQuery {
    /// Requested page, 1-based.
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }

    /// Requested page size.
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }
}

/// One page of finished games.
#[derive(Debug, Serialize, ToSchema)]
pub struct GamePage {
    /// Games of this page.
    pub items: Vec<GameListItem>,
    /// Page number.
    pub page: usize,
    /// Page size.
    pub limit: usize,
    /// Total number of finished games.
    pub total: usize,
}

impl GamePage {
    /// Slice `items` according to `query`.
    pub fn paginate(items: Vec<GameListItem>, query: &PageQuery) -> Self {
        let (page, limit) = (query.page(), query.limit());
        let total = items.len();
        let items = items
            .into_iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .collect();
        Self {
            items,
            page,
            limit,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn item(name: &str) -> GameListItem {
        GameListItem {
            id: Uuid::new_v4(),
            name: Some(name.into()),
            created_at: String::new(),
            updated_at: String::new(),
            finish_date: None,
            users: Vec::new(),
            winner: None,
        }
    }

    #[test]
    fn paginate_slices_and_reports_total() {
        let items = (0..5).map(|i| item(&i.to_string())).collect();
        let page = GamePage::paginate(
            items,
            &PageQuery {
                page: Some(2),
                limit: Some(2),
            },
        );

        assert_eq!(page.total, 5);
        let names = page
            .items
            .iter()
            .map(|i| i.name.as_deref().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["2", "3"]);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let page = GamePage::paginate(
            vec![item("only")],
            &PageQuery {
                page: Some(3),
                limit: None,
            },
        );
        assert!(page.items.is_empty());
        assert_eq!(page.limit, DEFAULT_PAGE_SIZE);
    }
}
