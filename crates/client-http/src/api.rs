use client_core::{ByteStream, TransportResponse};
use url::Url;

use crate::{
    models::{VideoData, WorkoutData},
    transport::{HttpTransport, TransportError},
};

const GET_VIDEO_PATH: &str = "get_video";
const GET_WORKOUTS_PATH: &str = "get_workouts";

#[derive(Debug, Clone)]
pub struct VideoApi {
    transport: HttpTransport,
}

impl VideoApi {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    pub fn base_url(&self) -> &Url {
        self.transport.base_url()
    }

    /// `GET get_video?id={id}`
    pub async fn get_video(&self, id: u32) -> Result<TransportResponse<VideoData>, TransportError> {
        self.transport
            .get_json(GET_VIDEO_PATH, &[("id", id.to_string())])
            .await
    }

    /// Download a resolved video link.
    pub async fn download(&self, link: &str) -> Result<TransportResponse<ByteStream>, TransportError> {
        let url = Url::parse(link).map_err(|source| TransportError::InvalidUrl {
            path: link.to_owned(),
            source,
        })?;
        self.transport.get_bytes(url).await
    }
}

#[derive(Debug, Clone)]
pub struct WorkoutsApi {
    transport: HttpTransport,
}

impl WorkoutsApi {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    /// `GET get_workouts`
    pub async fn get_workouts(&self) -> Result<TransportResponse<Vec<WorkoutData>>, TransportError> {
        self.transport.get_json(GET_WORKOUTS_PATH, &[]).await
    }
}
