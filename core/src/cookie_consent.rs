//! The built-in cookie consent property, appended to every registry.

use appstate_types::CookieConsent;

use crate::property::PropertyConfig;

pub const COOKIE_CONSENT_KEY: &str = "cookieConsent";
pub const COOKIE_CONSENT_COOKIE: &str = "cookie-consent";

fn parse_stored(item: Option<&str>) -> Option<CookieConsent> {
    match item {
        Some("true") => Some(Some(true)),
        Some("false") => Some(Some(false)),
        _ => None,
    }
}

#[must_use]
pub fn cookie_consent() -> PropertyConfig<CookieConsent> {
    PropertyConfig::new(COOKIE_CONSENT_KEY, Some(false), [Some(true), Some(false), None])
        .cookie(COOKIE_CONSENT_COOKIE)
        .server_value(|_, ctx| async move {
            Ok(Some(ctx.cookie(COOKIE_CONSENT_COOKIE) == Some("true")))
        })
        .client_value(|_, existing, env| async move {
            let browser = env.browser("getCookieConsentClientSide")?;
            let stored = browser.local_storage().get(COOKIE_CONSENT_KEY);
            Ok(parse_stored(stored.as_deref()).unwrap_or(existing))
        })
        .set_value(|args| async move {
            args.ensure_valid()?;
            let browser = args.browser("setCookieConsentClientSide")?;
            if args.value == Some(true) {
                browser.local_storage().set(COOKIE_CONSENT_KEY, "true");
                browser.cookies().set(COOKIE_CONSENT_COOKIE, "true");
            } else {
                browser.local_storage().remove(COOKIE_CONSENT_KEY);
                let purged = browser.cookies().cookies();
                browser.cookies().purge_all_except(&[]);
                tracing::info!(count = purged.len(), "cookie consent withdrawn; cookies purged");
            }
            Ok(())
        })
}
