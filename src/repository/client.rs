use async_trait::async_trait;
use tracing::debug;
use crate::{
    draft::ImageFile,
    error::Result,
    program::{Milestone, Program, ProgramPage, ProgramQuery},
    wizard::payload::ProgramPayload,
};

/// Remote program repository
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProgramRepository: Send + Sync {
    async fn get(&self, id: &str) -> Result<Program>;

    /// One page of programs matching the query
    async fn list(&self, query: &ProgramQuery) -> Result<ProgramPage>;

    /// Store a program image and return the reference programs carry
    async fn upload_image(&self, image: &ImageFile) -> Result<String>;

    async fn create(&self, payload: &ProgramPayload) -> Result<Program>;

    async fn update(&self, id: &str, payload: &ProgramPayload) -> Result<Program>;

    /// Return unused program funds to the sponsor
    async fn reclaim_program(&self, id: &str) -> Result<Program>;
}

/// Remote milestone repository
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MilestoneRepository: Send + Sync {
    async fn reclaim_milestone(&self, id: &str) -> Result<Milestone>;
}

/// Walk every page of a query
pub async fn fetch_all(repo: &dyn ProgramRepository, query: ProgramQuery) -> Result<Vec<Program>> {
    let mut programs = Vec::new();
    let mut query = query;

    loop {
        let page = repo.list(&query).await?;
        debug!(
            "Fetched page {} ({} programs) for {:?}",
            query.page,
            page.items.len(),
            query.filter
        );
        programs.extend(page.items);

        if !page.has_more {
            break;
        }
        query = query.next_page();
    }

    Ok(programs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::ProgramFilter;
    use mockall::predicate::function;

    fn program(id: &str) -> Program {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": id,
            "status": "published",
            "creatorId": "alice",
            "price": "1",
            "currency": "USDC"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_all_walks_pages() {
        let mut repo = MockProgramRepository::new();
        repo.expect_list()
            .with(function(|q: &ProgramQuery| q.page == 0))
            .times(1)
            .returning(|_| {
                Ok(ProgramPage {
                    items: vec![program("p1"), program("p2")],
                    has_more: true,
                })
            });
        repo.expect_list()
            .with(function(|q: &ProgramQuery| q.page == 1))
            .times(1)
            .returning(|_| {
                Ok(ProgramPage {
                    items: vec![program("p3")],
                    has_more: false,
                })
            });

        let query = ProgramQuery::new(ProgramFilter::Creator("alice".into()), 2);
        let programs = fetch_all(&repo, query).await.unwrap();
        let ids: Vec<&str> = programs.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2", "p3"]);
    }

    #[tokio::test]
    async fn test_fetch_all_propagates_errors() {
        let mut repo = MockProgramRepository::new();
        repo.expect_list()
            .returning(|_| Err(crate::error::GrantError::Remote("boom".into())));

        let query = ProgramQuery::new(ProgramFilter::Builder("bob".into()), 10);
        let err = fetch_all(&repo, query).await.unwrap_err();
        assert_eq!(err.user_message(), "boom");
    }
}
