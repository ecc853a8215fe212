mod error;
pub mod transport;

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::time::Instant;

pub use error::ArtworkError;
pub use transport::{CatalogTransport, HttpReply, ReqwestTransport};

const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1";
const CATALOG_LINK_HOSTS: [&str; 2] = ["open.spotify.com", "play.spotify.com"];
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

static REFERENCE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/(track|album|playlist)/([A-Za-z0-9]+)").expect("reference pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    Track,
    Album,
    Playlist,
}

impl CatalogKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CatalogKind::Track => "track",
            CatalogKind::Album => "album",
            CatalogKind::Playlist => "playlist",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRef {
    pub kind: CatalogKind,
    pub id: String,
}

/// Parses `.../(track|album|playlist)/<id>` out of a catalog URL.
pub fn parse_reference(url: &str) -> Option<CatalogRef> {
    let captures = REFERENCE_PATTERN.captures(url)?;
    let kind = match &captures[1] {
        "track" => CatalogKind::Track,
        "album" => CatalogKind::Album,
        _ => CatalogKind::Playlist,
    };
    Some(CatalogRef {
        kind,
        id: captures[2].to_string(),
    })
}

pub fn is_catalog_link(url: &str) -> bool {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|link| link.host_str().map(|host| CATALOG_LINK_HOSTS.contains(&host)))
        .unwrap_or(false)
}

#[derive(Debug, Clone, Default)]
pub struct CatalogCredentials {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl CatalogCredentials {
    pub fn is_configured(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct CatalogEndpoints {
    pub token_url: String,
    pub api_base: String,
}

impl Default for CatalogEndpoints {
    fn default() -> Self {
        Self {
            token_url: DEFAULT_TOKEN_URL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    /// Already pulled forward by [`TOKEN_EXPIRY_MARGIN`].
    expires_at: Instant,
}

#[derive(Deserialize)]
struct TokenGrant {
    access_token: String,
    expires_in: u64,
}

#[derive(Deserialize)]
struct Image {
    url: String,
}

#[derive(Deserialize)]
struct AlbumObject {
    #[serde(default)]
    images: Vec<Image>,
}

#[derive(Deserialize)]
struct TrackObject {
    album: Option<AlbumObject>,
}

pub struct ArtworkResolver {
    credentials: CatalogCredentials,
    endpoints: CatalogEndpoints,
    transport: Arc<dyn CatalogTransport>,
    token: RwLock<Option<AccessToken>>,
}

impl ArtworkResolver {
    pub fn new(
        credentials: CatalogCredentials,
        endpoints: CatalogEndpoints,
        transport: Arc<dyn CatalogTransport>,
    ) -> Self {
        Self {
            credentials,
            endpoints,
            transport,
            token: RwLock::new(None),
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_configured()
    }

    pub async fn get_access_token(&self) -> Result<String, ArtworkError> {
        let client_id = self
            .credentials
            .client_id
            .as_deref()
            .ok_or(ArtworkError::MissingCredential("SPOTIFY_CLIENT_ID"))?;
        let client_secret = self
            .credentials
            .client_secret
            .as_deref()
            .ok_or(ArtworkError::MissingCredential("SPOTIFY_CLIENT_SECRET"))?;

        if let Some(token) = self.token.read().as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        let reply = self
            .transport
            .post_form(
                &self.endpoints.token_url,
                (client_id, client_secret),
                &[("grant_type", "client_credentials")],
            )
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Error getting catalog access token"))?;
        let grant: TokenGrant = decode(reply)
            .inspect_err(|e| tracing::error!(error = ?e, "Error getting catalog access token"))?;

        let lifetime = Duration::from_secs(grant.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        let token = AccessToken {
            value: grant.access_token,
            expires_at: Instant::now() + lifetime,
        };
        tracing::debug!(lifetime_secs = lifetime.as_secs(), "Catalog access token refreshed");

        let value = token.value.clone();
        *self.token.write() = Some(token);
        Ok(value)
    }

    pub async fn fetch_track_artwork(&self, track_id: &str) -> Option<String> {
        let url = format!("{}/tracks/{}", self.endpoints.api_base, track_id);
        match self.get_json::<TrackObject>(&url).await {
            Ok(track) => track.album.and_then(|album| first_image(album.images)),
            Err(e) => {
                tracing::warn!(error = %e, track_id, "Error fetching track artwork");
                None
            }
        }
    }

    pub async fn fetch_album_artwork(&self, album_id: &str) -> Option<String> {
        let url = format!("{}/albums/{}", self.endpoints.api_base, album_id);
        match self.get_json::<AlbumObject>(&url).await {
            Ok(album) => first_image(album.images),
            Err(e) => {
                tracing::warn!(error = %e, album_id, "Error fetching album artwork");
                None
            }
        }
    }

    /// Best available artwork URL for a catalog URL. Playlists and
    /// unrecognised URLs resolve to `None` without any network traffic.
    pub async fn resolve(&self, url: &str) -> Option<String> {
        let reference = parse_reference(url)?;
        match reference.kind {
            CatalogKind::Track => self.fetch_track_artwork(&reference.id).await,
            CatalogKind::Album => self.fetch_album_artwork(&reference.id).await,
            CatalogKind::Playlist => None,
        }
    }

    /// Like [`Self::resolve`], but only for links pasted by users: anything
    /// not hosted by the catalog is skipped.
    pub async fn resolve_link(&self, url: &str) -> Option<String> {
        if !is_catalog_link(url) {
            return None;
        }
        self.resolve(url).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ArtworkError> {
        let token = self.get_access_token().await?;
        let reply = self.transport.get(url, &token).await?;
        decode(reply)
    }
}

fn decode<T: DeserializeOwned>(reply: HttpReply) -> Result<T, ArtworkError> {
    if !reply.is_success() {
        return Err(ArtworkError::Upstream {
            status: reply.status,
        });
    }
    Ok(serde_json::from_str(&reply.body)?)
}

// the catalog lists images largest first
fn first_image(images: Vec<Image>) -> Option<String> {
    images.into_iter().next().map(|image| image.url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_catalog_hosts_count_as_catalog_links() {
        assert!(is_catalog_link("https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC"));
        assert!(is_catalog_link("https://open.spotify.com/album/1DFixLWuPkv3KT3TnV35m3?si=abc"));
        assert!(!is_catalog_link("https://music.apple.com/us/album/some-name/1440857781"));
        assert!(!is_catalog_link("https://www.deezer.com/track/3135556"));
        assert!(!is_catalog_link("https://open.spotify.com.evil.example/track/abc"));
        assert!(!is_catalog_link("not a url"));
    }
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TOKEN_BODY: &str = r#"{"access_token":"tok-1","token_type":"Bearer","expires_in":3600}"#;

    struct FakeTransport {
        token_reply: Result<HttpReply, ArtworkError>,
        get_reply: fn() -> Result<HttpReply, ArtworkError>,
        token_calls: AtomicUsize,
        get_calls: AtomicUsize,
        requested: Mutex<Vec<(String, String)>>,
    }

    impl FakeTransport {
        fn new(get_reply: fn() -> Result<HttpReply, ArtworkError>) -> Self {
            Self {
                token_reply: Ok(ok(TOKEN_BODY)),
                get_reply,
                token_calls: AtomicUsize::new(0),
                get_calls: AtomicUsize::new(0),
                requested: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.token_calls.load(Ordering::SeqCst) + self.get_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CatalogTransport for FakeTransport {
        async fn post_form(
            &self,
            _url: &str,
            basic_auth: (&str, &str),
            form: &[(&str, &str)],
        ) -> Result<HttpReply, ArtworkError> {
            self.token_calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(basic_auth, ("id", "secret"));
            assert_eq!(form, &[("grant_type", "client_credentials")]);
            match &self.token_reply {
                Ok(reply) => Ok(reply.clone()),
                Err(ArtworkError::Upstream { status }) => {
                    Err(ArtworkError::Upstream { status: *status })
                }
                Err(e) => Err(ArtworkError::Transport(e.to_string())),
            }
        }

        async fn get(&self, url: &str, bearer: &str) -> Result<HttpReply, ArtworkError> {
            self.get_calls.fetch_add(1, Ordering::SeqCst);
            self.requested
                .lock()
                .push((url.to_string(), bearer.to_string()));
            (self.get_reply)()
        }
    }

    fn ok(body: &str) -> HttpReply {
        HttpReply {
            status: 200,
            body: body.to_string(),
        }
    }

    fn credentials() -> CatalogCredentials {
        CatalogCredentials {
            client_id: Some("id".to_string()),
            client_secret: Some("secret".to_string()),
        }
    }

    fn endpoints() -> CatalogEndpoints {
        CatalogEndpoints {
            token_url: "https://accounts.provider.example/api/token".to_string(),
            api_base: "https://api.provider.example/v1".to_string(),
        }
    }

    fn resolver(transport: Arc<FakeTransport>) -> ArtworkResolver {
        ArtworkResolver::new(credentials(), endpoints(), transport)
    }

    fn track_with_two_images() -> Result<HttpReply, ArtworkError> {
        Ok(ok(r#"{"album":{"images":[{"url":"A","height":640},{"url":"B","height":300}]}}"#))
    }

    fn track_without_images() -> Result<HttpReply, ArtworkError> {
        Ok(ok(r#"{"album":{"images":[]}}"#))
    }

    fn album_with_images() -> Result<HttpReply, ArtworkError> {
        Ok(ok(r#"{"images":[{"url":"cover-large"},{"url":"cover-small"}]}"#))
    }

    fn server_error() -> Result<HttpReply, ArtworkError> {
        Ok(HttpReply {
            status: 500,
            body: "oops".to_string(),
        })
    }

    fn timed_out() -> Result<HttpReply, ArtworkError> {
        Err(ArtworkError::Timeout)
    }

    #[test]
    fn parses_track_album_and_playlist_references() {
        assert_eq!(
            parse_reference("https://provider.example/track/AB12cd34"),
            Some(CatalogRef {
                kind: CatalogKind::Track,
                id: "AB12cd34".to_string(),
            })
        );
        assert_eq!(
            parse_reference("https://provider.example/playlist/XY99"),
            Some(CatalogRef {
                kind: CatalogKind::Playlist,
                id: "XY99".to_string(),
            })
        );
        assert_eq!(
            parse_reference("https://open.spotify.com/album/4aawyAB9vmqN3uQ7FjRGTy?si=abc"),
            Some(CatalogRef {
                kind: CatalogKind::Album,
                id: "4aawyAB9vmqN3uQ7FjRGTy".to_string(),
            })
        );
        assert_eq!(parse_reference("https://example.com/not-a-match"), None);
    }

    #[tokio::test]
    async fn playlist_resolves_to_none_without_network() {
        let transport = Arc::new(FakeTransport::new(track_with_two_images));
        let resolver = resolver(transport.clone());

        assert_eq!(resolver.resolve("https://provider.example/playlist/XY99").await, None);
        assert_eq!(resolver.resolve("https://example.com/not-a-match").await, None);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn foreign_links_are_not_looked_up_in_the_catalog() {
        let transport = Arc::new(FakeTransport::new(track_with_two_images));
        let resolver = resolver(transport.clone());

        assert_eq!(
            resolver
                .resolve_link("https://music.apple.com/us/album/some-name/1440857781")
                .await,
            None
        );
        assert_eq!(resolver.resolve_link("https://www.deezer.com/track/3135556").await, None);
        assert_eq!(transport.calls(), 0);

        let artwork = resolver
            .resolve_link("https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC")
            .await;
        assert_eq!(artwork.as_deref(), Some("A"));
        assert_eq!(transport.get_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn token_is_cached_until_expiry_margin() {
        let transport = Arc::new(FakeTransport::new(track_with_two_images));
        let resolver = resolver(transport.clone());

        assert_eq!(resolver.get_access_token().await.unwrap(), "tok-1");
        tokio::time::advance(Duration::from_secs(3000)).await;
        assert_eq!(resolver.get_access_token().await.unwrap(), "tok-1");
        assert_eq!(transport.token_calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(541)).await;
        resolver.get_access_token().await.unwrap();
        assert_eq!(transport.token_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn track_artwork_uses_first_image_and_bearer_token() {
        let transport = Arc::new(FakeTransport::new(track_with_two_images));
        let resolver = resolver(transport.clone());

        let artwork = resolver.resolve("https://provider.example/track/AB12cd34").await;

        assert_eq!(artwork.as_deref(), Some("A"));
        assert_eq!(
            transport.requested.lock().as_slice(),
            &[(
                "https://api.provider.example/v1/tracks/AB12cd34".to_string(),
                "tok-1".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn album_artwork_uses_album_endpoint() {
        let transport = Arc::new(FakeTransport::new(album_with_images));
        let resolver = resolver(transport.clone());

        let artwork = resolver.resolve("https://provider.example/album/XYZ123").await;

        assert_eq!(artwork.as_deref(), Some("cover-large"));
        assert_eq!(
            transport.requested.lock()[0].0,
            "https://api.provider.example/v1/albums/XYZ123"
        );
    }

    #[tokio::test]
    async fn empty_image_list_yields_none() {
        let resolver = resolver(Arc::new(FakeTransport::new(track_without_images)));
        assert_eq!(resolver.fetch_track_artwork("AB12cd34").await, None);
    }

    #[tokio::test]
    async fn upstream_failures_are_swallowed() {
        let resolver = resolver(Arc::new(FakeTransport::new(server_error)));
        assert_eq!(resolver.resolve("https://provider.example/track/AB12cd34").await, None);

        let resolver = resolver_with_timeout();
        assert_eq!(resolver.resolve("https://provider.example/album/AB12cd34").await, None);
    }

    fn resolver_with_timeout() -> ArtworkResolver {
        resolver(Arc::new(FakeTransport::new(timed_out)))
    }

    #[tokio::test]
    async fn token_endpoint_status_is_reported_and_not_cached() {
        let mut transport = FakeTransport::new(track_with_two_images);
        transport.token_reply = Ok(HttpReply {
            status: 401,
            body: String::new(),
        });
        let transport = Arc::new(transport);
        let resolver = resolver(transport.clone());

        let err = resolver.get_access_token().await.unwrap_err();
        assert!(matches!(err, ArtworkError::Upstream { status: 401 }));

        assert!(resolver.get_access_token().await.is_err());
        assert_eq!(transport.token_calls.load(Ordering::SeqCst), 2);
        assert_eq!(resolver.resolve("https://provider.example/track/AB12cd34").await, None);
        assert_eq!(transport.get_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_credentials_fail_token_but_not_resolve() {
        let transport = Arc::new(FakeTransport::new(track_with_two_images));
        let resolver = ArtworkResolver::new(
            CatalogCredentials {
                client_id: Some("id".to_string()),
                client_secret: None,
            },
            endpoints(),
            transport.clone(),
        );

        assert!(!resolver.has_credentials());
        assert!(matches!(
            resolver.get_access_token().await,
            Err(ArtworkError::MissingCredential("SPOTIFY_CLIENT_SECRET"))
        ));
        assert_eq!(resolver.resolve("https://provider.example/track/AB12cd34").await, None);
        assert_eq!(transport.calls(), 0);
    }
}
