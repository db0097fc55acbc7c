//! AWS console sign-in URLs from federation credentials.

use serde::Deserialize;
use tracing::debug;

use crate::cache::CacheEntry;
use crate::errors::{CawsError, Result};

/// AWS federation endpoint.
const FEDERATION_ENDPOINT: &str = "https://signin.aws.amazon.com/federation";

/// Where the console lands after sign-in.
const CONSOLE_DESTINATION: &str = "https://console.aws.amazon.com/";

#[derive(Deserialize)]
struct SigninTokenResponse {
    #[serde(rename = "SigninToken")]
    signin_token: String,
}

/// Exchange federation credentials for a one-click console login URL.
pub fn console_login_url(entry: &CacheEntry) -> Result<String> {
    let session = serde_json::json!({
        "sessionId": entry.access_key_id,
        "sessionKey": entry.secret_access_key,
        "sessionToken": entry.session_token,
    })
    .to_string();

    debug!("requesting console sign-in token");
    let mut response = ureq::get(FEDERATION_ENDPOINT)
        .query("Action", "getSigninToken")
        .query("Session", &session)
        .header(
            "User-Agent",
            &format!("caws/{}", env!("CARGO_PKG_VERSION")),
        )
        .call()
        .map_err(|e| CawsError::TokenService(format!("failed to get sign-in token: {e}")))?;

    let token: SigninTokenResponse = response
        .body_mut()
        .read_json()
        .map_err(|e| CawsError::TokenService(format!("bad sign-in token response: {e}")))?;

    Ok(login_url(&token.signin_token))
}

/// Build the console login URL for a sign-in token.
pub fn login_url(signin_token: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("Action", "login")
        .append_pair("Destination", CONSOLE_DESTINATION)
        .append_pair("SigninToken", signin_token)
        .finish();
    format!("{FEDERATION_ENDPOINT}?{query}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_url_has_expected_shape() {
        let link = login_url("tok+en/=");
        assert_eq!(
            link,
            "https://signin.aws.amazon.com/federation?Action=login\
             &Destination=https%3A%2F%2Fconsole.aws.amazon.com%2F\
             &SigninToken=tok%2Ben%2F%3D"
        );
    }
}
