//! One-time interactive consent flow. Prints the authorization URL, waits
//! for the pasted code, and writes the token cache the main binary uses.

use std::env;
use std::io::{self, BufRead};

use oauth2::reqwest::http_client;
use oauth2::{AuthorizationCode, CsrfToken, RedirectUrl, Scope, TokenResponse};

use tutor_confirm::auth::{self, TokenCache};
use tutor_confirm::Config;

const SCOPES: [&str; 3] = [
    "https://www.googleapis.com/auth/gmail.send",
    "https://www.googleapis.com/auth/calendar.readonly",
    "https://www.googleapis.com/auth/spreadsheets.readonly",
];

fn main() {
    let config = Config::build(env::args()).expect("Failed to load configuration");

    let secret =
        auth::read_client_secret(&config.credentials_path).expect("Failed to read client secret");
    let client = auth::oauth_client(&secret)
        .expect("Malformed endpoint URL in client secret")
        .set_redirect_uri(
            RedirectUrl::new("http://localhost".to_string()).expect("Invalid redirect URL"),
        );

    let mut request = client.authorize_url(CsrfToken::new_random);
    for scope in SCOPES {
        request = request.add_scope(Scope::new(scope.to_string()));
    }
    let (authorize_url, _csrf) = request.add_extra_param("access_type", "offline").url();

    println!("Open this URL in a browser and authorize access:");
    println!("{authorize_url}");
    println!("Then paste the `code` query parameter from the redirect URL:");

    let mut code = String::new();
    io::stdin()
        .lock()
        .read_line(&mut code)
        .expect("Failed to read authorization code");

    let token = client
        .exchange_code(AuthorizationCode::new(code.trim().to_string()))
        .request(http_client)
        .expect("Authorization code exchange failed");

    let expiry = token
        .expires_in()
        .and_then(|d| chrono::Duration::from_std(d).ok())
        .map(|d| chrono::Utc::now() + d);
    let cache = TokenCache {
        access_token: token.access_token().secret().clone(),
        refresh_token: token.refresh_token().map(|t| t.secret().clone()),
        expiry,
    };
    auth::store_token(&config.token_cache_path, &cache).expect("Failed to write token cache");

    println!("Token cache written to {}", config.token_cache_path);
}
