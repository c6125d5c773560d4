use anyhow::Context;

pub static DEFAULT_API_URL: &str = "https://api.github.com";

/// largest page the reviews endpoint hands out
static REVIEWS_PER_PAGE: u32 = 100;
static REVIEWS_BODY_LIMIT: usize = 8 * 1024 * 1024;

#[derive(Debug, serde::Deserialize)]
pub struct PullRequest {
    pub number: u64,
}

#[derive(Debug, serde::Deserialize)]
pub struct PullRequestReview {
    pub pull_request: PullRequest,
}

/// The event payload shapes we know how to get a pull request from.
/// Variants are tried in declaration order. A shape only matches when
/// `number` is an integer, so `{"pull_request": {"number": "42"}}` matches
/// neither.
#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
pub enum Event {
    PullRequest {
        pull_request: PullRequest,
    },
    PullRequestReview {
        pull_request_review: PullRequestReview,
    },
}

impl Event {
    pub fn from_json(payload: &str) -> Result<Self, anyhow::Error> {
        let value: serde_json::Value =
            serde_json::from_str(payload).context("event payload is not valid JSON")?;

        // serde would also accept a struct spelled as an array
        if !value.is_object() {
            return Err(anyhow::anyhow!("Failed to extract pull request data."));
        }

        serde_json::from_value(value)
            .map_err(|_| anyhow::anyhow!("Failed to extract pull request data."))
    }

    pub fn pull_request_number(&self) -> u64 {
        match self {
            Event::PullRequest { pull_request } => pull_request.number,
            Event::PullRequestReview {
                pull_request_review,
            } => pull_request_review.pull_request.number,
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct PullRequestId<'a> {
    pub owner: &'a str,
    pub repo: &'a str,
    pub number: u64,
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct User {
    pub login: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Deserialize)]
pub enum ReviewState {
    #[serde(rename = "APPROVED")]
    Approved,
    #[serde(rename = "CHANGES_REQUESTED")]
    ChangesRequested,
    #[serde(rename = "COMMENTED")]
    Commented,
    #[serde(rename = "DISMISSED")]
    Dismissed,
    #[serde(rename = "PENDING")]
    Pending,
}

impl ReviewState {
    pub const ALL: [ReviewState; 5] = [
        ReviewState::Approved,
        ReviewState::ChangesRequested,
        ReviewState::Commented,
        ReviewState::Dismissed,
        ReviewState::Pending,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ReviewState::Approved => "APPROVED",
            ReviewState::ChangesRequested => "CHANGES_REQUESTED",
            ReviewState::Commented => "COMMENTED",
            ReviewState::Dismissed => "DISMISSED",
            ReviewState::Pending => "PENDING",
        }
    }

    /// Name of the step output carrying the count for this state.
    pub fn output_key(self) -> &'static str {
        match self {
            ReviewState::Approved => "approved",
            ReviewState::ChangesRequested => "changes_requested",
            ReviewState::Commented => "commented",
            ReviewState::Dismissed => "dismissed",
            ReviewState::Pending => "pending",
        }
    }

    /// Only these states take part in deduplication and in `valid_reviews`.
    pub fn is_valid(self) -> bool {
        match self {
            ReviewState::Approved | ReviewState::ChangesRequested => true,
            ReviewState::Commented | ReviewState::Dismissed | ReviewState::Pending => false,
        }
    }
}

impl std::fmt::Display for ReviewState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Deserialize)]
pub enum AuthorAssociation {
    #[serde(rename = "COLLABORATOR")]
    Collaborator,
    #[serde(rename = "CONTRIBUTOR")]
    Contributor,
    #[serde(rename = "FIRST_TIME_CONTRIBUTOR")]
    FirstTimeContributor,
    #[serde(rename = "FIRST_TIMER")]
    FirstTimer,
    #[serde(rename = "MEMBER")]
    Member,
    #[serde(rename = "OWNER")]
    Owner,
    #[serde(rename = "NONE")]
    None,
}

impl AuthorAssociation {
    pub fn is_collaborator(self) -> bool {
        match self {
            AuthorAssociation::Collaborator
            | AuthorAssociation::Member
            | AuthorAssociation::Owner
            | AuthorAssociation::Contributor => true,
            AuthorAssociation::FirstTimeContributor
            | AuthorAssociation::FirstTimer
            | AuthorAssociation::None => false,
        }
    }
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct Review {
    pub user: User,
    pub state: ReviewState,
    pub author_association: AuthorAssociation,
}

pub fn reviews_url(api_url: &str, pull_request: &PullRequestId) -> String {
    format!(
        "{}/repos/{}/{}/pulls/{}/reviews?per_page={}",
        api_url, pull_request.owner, pull_request.repo, pull_request.number, REVIEWS_PER_PAGE
    )
}

pub async fn list_reviews(
    api_url: &str,
    token: &str,
    pull_request: &PullRequestId<'_>,
) -> Result<Vec<Review>, anyhow::Error> {
    let url = reviews_url(api_url, pull_request);
    log::debug!("GET {}", url);

    // the runner enforces the step time limit
    let client = actix_web::client::Client::builder()
        .disable_timeout()
        .finish();
    let mut response = client
        .get(url.as_str())
        .header("User-Agent", "review-tally")
        .header("Accept", "application/vnd.github.v3+json")
        .header("Authorization", format!("token {}", token))
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("can't list reviews: {}", e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .body()
            .await
            .map_err(|e| anyhow::anyhow!("can't read error response: {}", e))?;
        return Err(anyhow::anyhow!(
            "listing reviews of {}/{}#{} failed: {}: {}",
            pull_request.owner,
            pull_request.repo,
            pull_request.number,
            status,
            String::from_utf8_lossy(&body)
        ));
    }

    let reviews = response
        .json::<Vec<Review>>()
        .limit(REVIEWS_BODY_LIMIT)
        .await
        .map_err(|e| anyhow::anyhow!("can't parse reviews: {}", e))?;

    Ok(reviews)
}
