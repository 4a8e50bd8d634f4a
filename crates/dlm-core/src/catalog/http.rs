//! Small blocking GET helper for catalog API calls.

use std::time::Duration;

use super::CatalogError;

const TIMEOUT: Duration = Duration::from_secs(60);

/// GET `url` and return the whole body. Non-2xx is an error.
pub(super) fn get_body(url: &url::Url) -> Result<Vec<u8>, CatalogError> {
    let mut easy = curl::easy::Easy::new();
    easy.url(url.as_str())?;
    easy.follow_location(true)?;
    easy.max_redirections(5)?;
    easy.connect_timeout(Duration::from_secs(30))?;
    easy.timeout(TIMEOUT)?;
    easy.accept_encoding("")?;

    let mut body = Vec::new();
    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    let code = easy.response_code()?;
    if !(200..300).contains(&code) {
        return Err(CatalogError::Http(code));
    }
    Ok(body)
}
