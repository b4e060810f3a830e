/// Points awarded per posting a user owns
pub const POINTS_PER_POSTING: i32 = 10;

/// Additional points awarded per verified posting
pub const POINTS_PER_VERIFIED_POSTING: i32 = 20;

/// Hours after a global reset during which score recomputation is skipped
pub const RESET_GRACE_HOURS: i64 = 24;

/// Minimum age of the previous reset before the weekly slot fires again
pub const RESET_INTERVAL_DAYS: i64 = 7;

/// Hours a read notification stays in the inbox before the expiry sweep
/// removes it
pub const NOTIFICATION_TTL_HOURS: i64 = 24;

/// Ranks that trigger a milestone notification when reached by improvement
pub const RANK_MILESTONES: [i64; 4] = [1, 2, 3, 10];

/// Size of the rank window tracked for notifications; falling outside it
/// clears the remembered rank
pub const TOP_RANK_WINDOW: i64 = 10;

/// Number of entries returned by the leaderboard listing
pub const LEADERBOARD_LIMIT: i64 = 30;

/// Postings per page in the finder listing
pub const POSTINGS_PAGE_SIZE: i64 = 8;

/// Minimum average rating for a posting to be featured
pub const FEATURED_MIN_AVG_RATING: f64 = 4.0;

/// Number of featured postings shown alongside the first page
pub const FEATURED_LIMIT: i64 = 3;

/// Maximum length of a posting name
pub const MAX_POSTING_NAME_LEN: usize = 200;

/// Maximum length of a posting address
pub const MAX_POSTING_ADDRESS_LEN: usize = 255;

/// Maximum length of a username
pub const MAX_USERNAME_LEN: usize = 30;

/// Sectors a posting may belong to
pub const SECTORS: [&str; 14] = [
    "Education",
    "Health",
    "Government",
    "Banking",
    "Tech",
    "NGO",
    "Oil and Gas",
    "Media",
    "Agriculture",
    "Legal",
    "Manufacturing",
    "Hospitality",
    "Telecommunications",
    "Private",
];

// =============================================================================
// Notification Messages
// =============================================================================

/// Broadcast message sent to every user when the leaderboard is reset
pub const MSG_LEADERBOARD_RESET: &str =
    "Leaderboard has been reset! Start earning points with new postings!";

// =============================================================================
// Error Messages
// =============================================================================

/// Error message for an unknown sector
pub const ERR_UNKNOWN_SECTOR: &str = "Unknown sector";

/// Error message for a username that is empty or too long
pub const ERR_INVALID_USERNAME: &str =
    "Username must be 1-30 characters of letters, numbers, '-' or '_'";

/// Error message for attempting to follow yourself
pub const ERR_SELF_FOLLOW: &str = "You cannot follow yourself.";

/// Error message for a verification request on an already-pending posting
pub const ERR_VERIFICATION_PENDING: &str = "A verification request is already pending.";

/// Error message for an empty verification document
pub const ERR_EMPTY_DOCUMENT: &str = "Please provide the verification document text.";
