use crate::actions::OutputSink;
use crate::ghapi::{Review, ReviewState};
use std::collections::HashSet;

/// Bot account whose reviews never count. TODO: turn this into an action input
/// once a second repository needs a different bot excluded.
pub static EXCLUDED_LOGIN: &str = "rnd-johnny5";

pub static VALID_REVIEWS_KEY: &str = "valid_reviews";

/// Reviews that count: one per collaborator, their first approve or
/// request-changes review. Later reviews by the same author are ignored.
pub fn counted_reviews(reviews: &[Review]) -> Vec<&Review> {
    let reviews: Vec<&Review> = reviews
        .iter()
        .filter(|r| r.user.login != EXCLUDED_LOGIN)
        .filter(|r| r.author_association.is_collaborator())
        .collect();

    log::debug!("{} total valid reviews", reviews.len());

    let mut seen = HashSet::new();
    let reviews: Vec<&Review> = reviews
        .into_iter()
        .filter(|&r| r.state.is_valid() && seen.insert(r.user.login.as_str()))
        .collect();

    for review in &reviews {
        println!("{}", found_review(review));
    }

    reviews
}

/// Printed for every counted review, independent of the log filter.
fn found_review(review: &Review) -> String {
    format!("Found Review from {} they {}", review.user.login, review.state)
}

#[derive(Debug, PartialEq, Eq)]
pub struct Tally {
    counts: Vec<(ReviewState, usize)>,
}

impl Tally {
    pub fn from_reviews(reviews: &[Review]) -> Self {
        let counted = counted_reviews(reviews);
        let counts = ReviewState::ALL
            .iter()
            .map(|&state| (state, counted.iter().filter(|r| r.state == state).count()))
            .collect();

        Tally { counts }
    }

    pub fn count(&self, state: ReviewState) -> usize {
        self.counts
            .iter()
            .find(|(s, _)| *s == state)
            .map_or(0, |(_, count)| *count)
    }

    pub fn valid_reviews(&self) -> usize {
        ReviewState::ALL
            .iter()
            .filter(|state| state.is_valid())
            .map(|&state| self.count(state))
            .sum()
    }

    pub fn report<S: OutputSink>(&self, outputs: &mut S) -> Result<(), anyhow::Error> {
        for (state, count) in &self.counts {
            log::debug!("  {}: {}", state.output_key(), count);
            outputs.set_output(state.output_key(), &count.to_string())?;
        }

        outputs.set_output(VALID_REVIEWS_KEY, &self.valid_reviews().to_string())
    }
}
