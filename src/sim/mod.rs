//! Deterministic simulation module
//!
//! Entities and the physics that moves them. Nothing here touches the event
//! bus or the feature registry:
//! - Fixed timestep only
//! - Randomness comes from an injected generator
//! - Stable iteration order (slice order, ids ascending)

pub mod ball;
pub mod bucket;
pub mod collision;
pub mod creature;
pub mod physics;
pub mod pin;

pub use ball::{Ball, BallState};
pub use bucket::{Bucket, BucketKind, best_bucket, layout_buckets};
pub use collision::{CollisionResult, Rect, circle_circle, circle_rect_overlap, reflect_velocity};
pub use creature::Creature;
pub use physics::{Contact, ContactKind, PhysicsWorld};
pub use pin::{Pin, PinId};
