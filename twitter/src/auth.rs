use serde::Deserialize;
use serde_json::{json, Value};

use crate::client::TwitterClient;
use crate::error::TwitterError;
use crate::response_helpers::api_error_message;

/// Upper bound on onboarding round trips before giving up on a login.
const MAX_LOGIN_STEPS: usize = 12;

#[derive(Clone, Debug)]
pub struct LoginInfo {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug)]
struct GuestToken {
    guest_token: String,
}

#[derive(Deserialize, Debug)]
struct FlowResponse {
    flow_token: String,
    #[serde(default)]
    subtasks: Vec<Subtask>,
}

#[derive(Deserialize, Debug)]
struct Subtask {
    subtask_id: String,
}

/// What to send back for one onboarding subtask.
#[derive(Debug, PartialEq)]
enum LoginStep {
    Respond(Value),
    Done,
}

pub(crate) async fn login(client: &TwitterClient, info: &LoginInfo) -> Result<(), TwitterError> {
    let guest_token = guest_token(client).await?;
    tracing::debug!("activated guest token");

    let start = json!({
        "input_flow_data": {
            "flow_context": {
                "debug_overrides": {},
                "start_location": {"location": "splash_screen"}
            }
        },
        "subtask_versions": {}
    });
    let mut flow = onboarding_task(client, &guest_token, Some("login"), &start).await?;

    for _ in 0..MAX_LOGIN_STEPS {
        let subtask_id = match flow.subtasks.first() {
            Some(s) => s.subtask_id.as_str(),
            None => return Ok(()),
        };
        tracing::debug!(subtask_id, "login subtask");

        let input = match respond(subtask_id, info)? {
            LoginStep::Done => return Ok(()),
            LoginStep::Respond(input) => input,
        };
        let body = json!({
            "flow_token": flow.flow_token,
            "subtask_inputs": [input],
        });
        flow = onboarding_task(client, &guest_token, None, &body).await?;
    }

    Err(TwitterError::Auth(format!(
        "login flow did not finish after {} steps",
        MAX_LOGIN_STEPS
    )))
}

fn respond(subtask_id: &str, info: &LoginInfo) -> Result<LoginStep, TwitterError> {
    let input = match subtask_id {
        "LoginSuccessSubtask" => return Ok(LoginStep::Done),
        "LoginJsInstrumentationSubtask" => json!({
            "subtask_id": subtask_id,
            "js_instrumentation": {"response": "{}", "link": "next_link"}
        }),
        "LoginEnterUserIdentifierSSO" => json!({
            "subtask_id": subtask_id,
            "settings_list": {
                "setting_responses": [{
                    "key": "user_identifier",
                    "response_data": {"text_data": {"result": info.username}}
                }],
                "link": "next_link"
            }
        }),
        // Unusual activity check and email confirmation both ask for the email
        "LoginEnterAlternateIdentifierSubtask" | "LoginAcid" => json!({
            "subtask_id": subtask_id,
            "enter_text": {"text": info.email, "link": "next_link"}
        }),
        "LoginEnterPassword" => json!({
            "subtask_id": subtask_id,
            "enter_password": {"password": info.password, "link": "next_link"}
        }),
        "AccountDuplicationCheck" => json!({
            "subtask_id": subtask_id,
            "check_logged_in_account": {"link": "AccountDuplicationCheck_false"}
        }),
        "DenyLoginSubtask" => {
            return Err(TwitterError::Auth("login denied".to_owned()));
        }
        other => {
            return Err(TwitterError::Auth(format!(
                "unsupported login step: {}",
                other
            )));
        }
    };
    Ok(LoginStep::Respond(input))
}

async fn guest_token(client: &TwitterClient) -> Result<String, TwitterError> {
    let resp = client
        .api_request(client.http.post(client.url("/1.1/guest/activate.json")?))
        .send()
        .await?;
    let status = resp.status();
    let text = resp.text().await?;
    if !status.is_success() {
        return Err(TwitterError::Auth(format!(
            "unable to activate guest token, status {}",
            status
        )));
    }
    let token: GuestToken = serde_json::from_str(&text)?;
    Ok(token.guest_token)
}

async fn onboarding_task(
    client: &TwitterClient,
    guest_token: &str,
    flow_name: Option<&str>,
    body: &Value,
) -> Result<FlowResponse, TwitterError> {
    let mut url = client.url("/1.1/onboarding/task.json")?;
    if let Some(name) = flow_name {
        url.query_pairs_mut().append_pair("flow_name", name);
    }

    let resp = client
        .api_request(client.http.post(url))
        .header("x-guest-token", guest_token)
        .json(body)
        .send()
        .await?;
    let status = resp.status();
    let text = resp.text().await?;
    if !status.is_success() {
        let msg = api_error_message(&text).unwrap_or_else(|| format!("status {}", status));
        return Err(TwitterError::Auth(msg));
    }

    Ok(serde_json::from_str(&text)?)
}
