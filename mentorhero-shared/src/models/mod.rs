/// Data models for MentorHero
///
/// This module contains the data structures and database operations
/// behind the marketplace: accounts, the subject catalog, the tutoring
/// request lifecycle, and the ratings both sides exchange after a
/// session.
///
/// Each model follows the same pattern: a struct mapping one table,
/// input structs for the write operations, and async methods that take a
/// `PgPool` (or a `PgConnection` where the caller owns the transaction).

pub mod major;
pub mod rating;
pub mod request;
pub mod subject;
pub mod user;

pub use major::Major;
pub use rating::{LearnerRating, SessionOutcome, TutorRating};
pub use request::{RequestStatus, TutoringRequest};
pub use subject::Subject;
pub use user::{User, UserRole};
