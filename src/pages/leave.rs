use std::time::Duration;
use url::Url;

use crate::geo::{locate_best_effort, Geolocator};
use crate::models::Coordinates;

// Navigation should not hang on a slow fix
pub const LEAVE_GEO_TIMEOUT: Duration = Duration::from_millis(3000);

/// Leave-request page URL, prefilled with the employee and position if known.
pub fn leave_request_url(
    base: &str,
    employee_name: &str,
    position: Option<Coordinates>,
) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(base)?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("employee", employee_name);
        if let Some(position) = position {
            query.append_pair("pf_lat", &position.lat.to_string());
            query.append_pair("pf_lng", &position.lng.to_string());
        }
    }
    Ok(url)
}

pub async fn leave_request_link(
    base: &str,
    employee_name: &str,
    geo: &dyn Geolocator,
) -> Result<Url, url::ParseError> {
    // validate before waiting on geolocation
    Url::parse(base)?;
    let position = locate_best_effort(geo, LEAVE_GEO_TIMEOUT).await;
    leave_request_url(base, employee_name, position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{FixedLocator, NoLocator};

    #[test]
    fn employee_is_encoded_into_the_query() {
        let url = leave_request_url("https://hr.example/leave-request/", "Asha Gurung", None).unwrap();
        assert_eq!(url.as_str(), "https://hr.example/leave-request/?employee=Asha+Gurung");
    }

    #[tokio::test]
    async fn position_is_added_when_available() {
        let geo = FixedLocator::new(Coordinates { lat: 27.5, lng: 85.25 });
        let url = leave_request_link("https://hr.example/leave-request/", "Asha", &geo)
            .await
            .unwrap();
        assert_eq!(
            url.query(),
            Some("employee=Asha&pf_lat=27.5&pf_lng=85.25")
        );
    }

    #[tokio::test]
    async fn no_position_still_navigates() {
        let url = leave_request_link("https://hr.example/leave-request/", "Asha", &NoLocator)
            .await
            .unwrap();
        assert_eq!(url.query(), Some("employee=Asha"));
    }

    #[tokio::test]
    async fn bad_base_is_an_error() {
        assert!(leave_request_link("not a url", "Asha", &NoLocator).await.is_err());
    }
}
