use anyhow::{Context, Result};
use time::format_description::well_known::Rfc3339;

use chartlink_auth::TokenIssuer;
use chartlink_core::now_utc;

use crate::cli::TokenArgs;
use crate::output::{print_field, print_success};

pub async fn token(issuer: &TokenIssuer, args: &TokenArgs) -> Result<()> {
    let scopes = (!args.scopes.is_empty()).then_some(args.scopes.as_slice());
    let token = issuer
        .try_get_token(scopes, args.force)
        .await
        .context("Failed to obtain access token")?;

    let expires_at = token.expires_at();
    let remaining = (expires_at - now_utc()).whole_seconds().max(0);

    print_success("Access token acquired");
    print_field("Type", token.token_type());
    print_field("Scopes", token.scopes().join(" "));
    print_field(
        "Expires",
        format!(
            "{} (in {remaining}s)",
            expires_at.format(&Rfc3339).context("Failed to format expiry")?
        ),
    );
    print_field("Token", format!("<redacted, {} chars>", token.value().len()));
    Ok(())
}
