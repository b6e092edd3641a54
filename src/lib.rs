//! Adaptive coaching control loop.
//!
//! The decision core of a personal fitness-coaching app: weight-trend
//! classification, check-in escalation, calorie/macro and cardio plan
//! adjustment, a live interval session engine, and the weekly adherence
//! record coupling sessions back into the next check-in. Invoked as library
//! functions from a UI/controller layer; all persistence goes through the
//! sqlite pool owned by [`db`].

pub mod adherence;
pub mod apply;
pub mod checkin;
pub mod db;
pub mod escalation;
pub mod models;
pub mod proposal;
pub mod session;
pub mod trend;

#[cfg(test)]
pub mod test_utils;
