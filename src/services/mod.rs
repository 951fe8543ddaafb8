// Services - graph, feed, post and profile operations. Each takes the
// request's ViewerContext and rejects anonymous callers.

pub mod annotate;
pub mod feed;
pub mod follow_graph;
pub mod graph_query;
pub mod notifications;
pub mod posts;
pub mod profiles;

pub use annotate::{annotate, Annotated, Owned};
pub use feed::{FeedAssembler, FeedEntry, FEED_LIMIT};
pub use follow_graph::FollowGraphStore;
pub use graph_query::GraphQueryEngine;
pub use notifications::{LogNotifier, PushMessage, PushNotifier};
pub use posts::PostService;
pub use profiles::{ProfileService, ProfileUpdate};
