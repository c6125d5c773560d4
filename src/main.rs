use anyhow::Context;

mod actions;
mod ghapi;
mod tally;

static TOKEN_INPUT: &str = "repo-token";

#[derive(Debug)]
struct Config {
    /// token for the pull request reviews API
    token: String,
    /// JSON payload of the event that triggered the workflow
    event_path: std::path::PathBuf,
    /// `owner/repo` the workflow runs in
    repository: String,
    /// REST API base URL, without trailing slash
    api_url: String,
    /// file the runner reads step outputs from
    output_path: Option<std::path::PathBuf>,
}

impl Config {
    fn from_env() -> Result<Self, anyhow::Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let required =
            |name: &str| var(name).ok_or_else(|| anyhow::anyhow!("{} is not set", name));

        let token = var(actions::input_var(TOKEN_INPUT).as_str())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| anyhow::anyhow!("Input required and not supplied: {}", TOKEN_INPUT))?;

        Ok(Config {
            token,
            event_path: required("GITHUB_EVENT_PATH")?.into(),
            repository: required("GITHUB_REPOSITORY")?,
            api_url: var("GITHUB_API_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|| ghapi::DEFAULT_API_URL.to_string()),
            output_path: var("GITHUB_OUTPUT").map(Into::into),
        })
    }
}

fn split_repository(repository: &str) -> Result<(&str, &str), anyhow::Error> {
    lazy_static::lazy_static! {
        static ref REPOSITORY_REGEX: regex::Regex =
            regex::Regex::new(r"^([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+)$").unwrap();
    }

    REPOSITORY_REGEX
        .captures(repository)
        .and_then(|c| Some((c.get(1)?.as_str(), c.get(2)?.as_str())))
        .ok_or_else(|| anyhow::anyhow!("repository {:?} is not of the form owner/repo", repository))
}

fn pull_request_id<'a>(
    payload: &str,
    repository: &'a str,
) -> Result<ghapi::PullRequestId<'a>, anyhow::Error> {
    let number = ghapi::Event::from_json(payload)?.pull_request_number();
    let (owner, repo) = split_repository(repository)?;

    Ok(ghapi::PullRequestId {
        owner,
        repo,
        number,
    })
}

async fn run(config: &Config) -> Result<(), anyhow::Error> {
    let payload = tokio::fs::read_to_string(&config.event_path)
        .await
        .with_context(|| format!("can't read event payload {}", config.event_path.display()))?;
    let pull_request = pull_request_id(&payload, &config.repository)?;

    let reviews = ghapi::list_reviews(&config.api_url, &config.token, &pull_request).await?;
    let tally = tally::Tally::from_reviews(&reviews);

    tally.report(&mut actions::Outputs::new(config.output_path.clone()))
}

#[actix_web::main]
async fn main() {
    actions::init_logger();

    let result = match Config::from_env() {
        Ok(config) => run(&config).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        actions::set_failed(&e);
    }
}
