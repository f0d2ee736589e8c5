//! Browser fingerprint for outgoing requests.
//!
//! Ranking sites sit behind bot filters that reject obviously scripted
//! clients. Requests carry a plausible desktop browser profile instead of the
//! default reqwest User-Agent.

use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};

const CHROME_VERSIONS: [(&str, &str); 3] = [
    ("131", "131.0.6778.108"),
    ("132", "132.0.6834.83"),
    ("133", "133.0.6943.53"),
];

const FIREFOX_VERSIONS: [&str; 3] = ["133.0", "134.0", "135.0"];

/// Browser profile sent with every request.
#[derive(Debug, Clone)]
pub struct BrowserProfile {
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
    pub sec_ch_ua: String,
    pub sec_ch_ua_platform: String,
}

#[derive(Debug, Clone, Copy)]
enum Platform {
    MacOS,
    Windows,
    Linux,
}

impl Platform {
    fn random() -> Self {
        let mut rng = rand::thread_rng();
        // Windows 65%, macOS 20%, Linux 15%
        let roll: f32 = rng.gen();
        if roll < 0.65 {
            Platform::Windows
        } else if roll < 0.85 {
            Platform::MacOS
        } else {
            Platform::Linux
        }
    }

    fn os_string(self) -> &'static str {
        match self {
            Platform::MacOS => "Macintosh; Intel Mac OS X 10_15_7",
            Platform::Windows => "Windows NT 10.0; Win64; x64",
            Platform::Linux => "X11; Linux x86_64",
        }
    }

    fn sec_ch_platform(self) -> &'static str {
        match self {
            Platform::MacOS => "\"macOS\"",
            Platform::Windows => "\"Windows\"",
            Platform::Linux => "\"Linux\"",
        }
    }
}

/// Generate a Chrome desktop profile.
#[must_use]
pub fn chrome_profile() -> BrowserProfile {
    let mut rng = rand::thread_rng();
    let platform = Platform::random();
    let (major, full) = CHROME_VERSIONS
        .choose(&mut rng)
        .copied()
        .unwrap_or(CHROME_VERSIONS[0]);

    BrowserProfile {
        user_agent: format!(
            "Mozilla/5.0 ({}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{full} Safari/537.36",
            platform.os_string()
        ),
        accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8"
            .to_string(),
        accept_language: "en-US,en;q=0.9".to_string(),
        sec_ch_ua: format!(
            "\"Google Chrome\";v=\"{major}\", \"Chromium\";v=\"{major}\", \"Not_A Brand\";v=\"24\""
        ),
        sec_ch_ua_platform: platform.sec_ch_platform().to_string(),
    }
}

/// Generate a Firefox desktop profile.
#[must_use]
pub fn firefox_profile() -> BrowserProfile {
    let mut rng = rand::thread_rng();
    let platform = Platform::random();
    let version = FIREFOX_VERSIONS
        .choose(&mut rng)
        .copied()
        .unwrap_or(FIREFOX_VERSIONS[0]);

    BrowserProfile {
        user_agent: format!(
            "Mozilla/5.0 ({}; rv:{version}) Gecko/20100101 Firefox/{version}",
            platform.os_string()
        ),
        accept: "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".to_string(),
        accept_language: "en-US,en;q=0.5".to_string(),
        // Firefox doesn't send Sec-CH-UA headers
        sec_ch_ua: String::new(),
        sec_ch_ua_platform: String::new(),
    }
}

/// Random profile, weighted towards Chrome.
#[must_use]
pub fn random_profile() -> BrowserProfile {
    let roll: f32 = rand::thread_rng().gen();
    if roll < 0.75 {
        chrome_profile()
    } else {
        firefox_profile()
    }
}

impl BrowserProfile {
    /// Profile with a fixed User-Agent and no client hints.
    #[must_use]
    pub fn with_user_agent(user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            sec_ch_ua: String::new(),
            sec_ch_ua_platform: String::new(),
            ..firefox_profile()
        }
    }

    /// Convert profile to reqwest `HeaderMap`.
    ///
    /// Values that are not valid header text are left out rather than sent
    /// malformed.
    pub fn to_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let mut put = |name: HeaderName, value: &str| {
            if value.is_empty() {
                return;
            }
            if let Ok(v) = HeaderValue::from_str(value) {
                headers.insert(name, v);
            }
        };

        put(USER_AGENT, &self.user_agent);
        put(ACCEPT, &self.accept);
        put(ACCEPT_LANGUAGE, &self.accept_language);
        put(HeaderName::from_static("sec-ch-ua"), &self.sec_ch_ua);
        put(
            HeaderName::from_static("sec-ch-ua-platform"),
            &self.sec_ch_ua_platform,
        );
        if !self.sec_ch_ua.is_empty() {
            put(HeaderName::from_static("sec-ch-ua-mobile"), "?0");
        }
        put(HeaderName::from_static("sec-fetch-dest"), "document");
        put(HeaderName::from_static("sec-fetch-mode"), "navigate");
        put(HeaderName::from_static("sec-fetch-site"), "none");

        headers
    }
}
