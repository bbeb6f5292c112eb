//! [`Query`] collection related to the multiple [`Teacher`]s.

use common::operations::By;

use crate::read;
#[cfg(doc)]
use crate::{domain::Teacher, Query};

use super::DatabaseQuery;

/// Queries a list of [`Teacher`]s.
pub type List =
    DatabaseQuery<By<read::teacher::list::Page, read::teacher::list::Selector>>;

#[cfg(test)]
mod spec {
    use crate::{
        domain::teacher::NormalizedName, infra::Memory, read::teacher::list,
        testing, Query as _, Service,
    };

    use super::List;

    async fn search(svc: &Service<Memory>, name: &str) -> Vec<String> {
        let page = svc
            .execute(List::by(list::Selector {
                arguments: list::Arguments::default(),
                filter: list::Filter {
                    name: NormalizedName::new(name),
                },
            }))
            .await
            .unwrap();
        page.items
            .into_iter()
            .map(|t| t.full_name.to_string())
            .collect()
    }

    #[tokio::test]
    async fn searches_words_in_order() {
        let svc = Service::in_memory();
        _ = testing::teacher(&svc, "Ana María González").await;
        _ = testing::teacher(&svc, "Pedro Martínez").await;

        assert_eq!(search(&svc, "maria GONZ").await, ["Ana María González"]);
        assert!(search(&svc, "gonzalez maria").await.is_empty());
        assert_eq!(search(&svc, "").await.len(), 2);
    }
}
