use super::{
    category::Category,
    comment::CommentNode,
    newtypes::{CategoryId, PostId, UserId},
    user::User,
};
use crate::schema::post;
use chrono::{DateTime, Utc};
use diesel::{Identifiable, Queryable, Selectable};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = post, check_for_backend(diesel::pg::Pg))]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub slug: String,
    pub creator_id: UserId,
    pub category_id: CategoryId,
    pub thumbnail: Option<String>,
    pub public: bool,
    pub deleted: bool,
    pub published: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
}

/// A post with everything needed to render its detail page, including the
/// comment thread assembled into a forest.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct PostView {
    pub post: Post,
    pub creator: User,
    pub category: Category,
    pub like_count: i64,
    pub dislike_count: i64,
    pub comments: Vec<CommentNode>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct GetPostParams {
    pub slug: String,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct ListPostsParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct SearchPostsParams {
    pub keyword: String,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct PostIdParams {
    pub post_id: PostId,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct ListPostsResponse {
    pub posts: Vec<Post>,
    pub pagination: Pagination,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(total: i64, page: i64, page_size: i64) -> Self {
        Pagination {
            total,
            page,
            total_pages: (total + page_size - 1) / page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pagination() {
        assert_eq!(0, Pagination::new(0, 1, 10).total_pages);
        assert_eq!(1, Pagination::new(1, 1, 10).total_pages);
        assert_eq!(1, Pagination::new(10, 1, 10).total_pages);
        assert_eq!(2, Pagination::new(11, 1, 10).total_pages);
        assert_eq!(3, Pagination::new(21, 2, 10).total_pages);
    }
}
