//! Yandex Disk REST backend.
//!
//! Upload protocol: request an upload href, PUT the bytes there, publish the resource,
//! then read back its `public_url`. Files live under `app:/{folder}/`.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Response};
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::{FileStore, StoreError};

pub const YANDEX_DISK_API: &str = "https://cloud-api.yandex.net/v1/disk";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct UploadLink {
    href: String,
}

#[derive(Debug, Deserialize)]
struct PublicResource {
    public_url: String,
}

pub struct YandexDiskStore {
    client: Client,
    api_base: String,
    token: String,
    folder: String,
    folder_ready: OnceCell<()>,
}

impl YandexDiskStore {
    pub fn new(api_base: String, token: String, folder: String) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StoreError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
            folder,
            folder_ready: OnceCell::new(),
        })
    }

    fn auth_header(&self) -> String {
        format!("OAuth {}", self.token)
    }

    fn disk_path(&self, name: &str) -> String {
        format!("app:/{}/{}", self.folder, name)
    }

    async fn create_folder(&self) -> Result<(), StoreError> {
        let response = self
            .client
            .put(format!("{}/resources", self.api_base))
            .query(&[("path", format!("app:/{}", self.folder))])
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(transport_error)?;

        // 409: folder already exists
        if response.status().as_u16() == 409 {
            debug!("Yandex Disk folder {} already exists", self.folder);
            return Ok(());
        }
        check_status(response, "create folder").await?;
        info!("Created Yandex Disk folder {}", self.folder);
        Ok(())
    }
}

#[async_trait]
impl FileStore for YandexDiskStore {
    async fn ensure_folder(&self) -> Result<(), StoreError> {
        self.folder_ready
            .get_or_try_init(|| self.create_folder())
            .await
            .map(|_| ())
    }

    async fn upload(
        &self,
        bytes: Bytes,
        destination: &str,
        content_type: &str,
    ) -> Result<String, StoreError> {
        self.ensure_folder().await?;
        let path = self.disk_path(destination);

        // 1. Upload link
        let response = self
            .client
            .get(format!("{}/resources/upload", self.api_base))
            .query(&[("path", path.as_str()), ("overwrite", "true")])
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(transport_error)?;
        let link: UploadLink = check_status(response, "request upload link")
            .await?
            .json()
            .await
            .map_err(transport_error)?;

        // 2. Bytes go to the pre-signed href, no auth header
        let response = self
            .client
            .put(&link.href)
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await
            .map_err(transport_error)?;
        check_status(response, "upload file").await?;

        // 3. Publish
        let response = self
            .client
            .put(format!("{}/resources/publish", self.api_base))
            .query(&[("path", path.as_str())])
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(transport_error)?;
        check_status(response, "publish file").await?;

        // 4. Public URL
        let response = self
            .client
            .get(format!("{}/resources", self.api_base))
            .query(&[("path", path.as_str()), ("fields", "public_url")])
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(transport_error)?;
        let resource: PublicResource = check_status(response, "fetch public url")
            .await?
            .json()
            .await
            .map_err(transport_error)?;

        info!("Uploaded {} to Yandex Disk", path);
        Ok(resource.public_url)
    }
}

fn transport_error(e: reqwest::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

async fn check_status(response: Response, step: &str) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = format!("{step} failed: {body}");
    Err(match status.as_u16() {
        401 | 403 => StoreError::Auth(message),
        _ if status.is_server_error() => StoreError::Unavailable(message),
        s => StoreError::Rejected { status: s, message },
    })
}
