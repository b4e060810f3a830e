pub mod follow;
pub mod leaderboard;
pub mod notification;
pub mod posting;
pub mod review;
pub mod user;

pub use follow::Follow;
pub use leaderboard::{LeaderboardEntry, LeaderboardReset};
pub use notification::{Notification, NotificationKind};
pub use posting::{Posting, VerificationStatus};
pub use review::Review;
pub use user::User;
