use client_core::{
    AppError, ByteStream, DataMapper, LocalStream, RemoteStream, RequestExecutor,
    SavedWorkoutRepository, UnknownAppError, Video, VideoRepository, Workout, WorkoutRepository,
    local_request, local_request_for_list,
};
use client_platform::{RecordStore, RecordStoreError};
use tracing::debug;

use crate::{
    api::{VideoApi, WorkoutsApi},
    models::{SavedWorkoutRecord, VideoData},
};

#[derive(Debug, Clone)]
pub struct HttpVideoRepository {
    api: VideoApi,
    executor: RequestExecutor,
}

impl HttpVideoRepository {
    pub fn new(api: VideoApi, executor: RequestExecutor) -> Self {
        Self { api, executor }
    }
}

impl VideoRepository for HttpVideoRepository {
    fn get_video_by_id(&self, id: u32) -> RemoteStream<Video> {
        let api = self.api.clone();
        let base_url = self.api.base_url().clone();
        self.executor.network_request(
            move || async move { api.get_video(id).await },
            move |data: VideoData| data.into_video(&base_url),
        )
    }

    fn open_video(&self, video: &Video) -> RemoteStream<ByteStream> {
        let api = self.api.clone();
        let link = video.link.clone();
        self.executor
            .network_request_byte_stream(move || async move { api.download(&link).await })
    }
}

#[derive(Debug, Clone)]
pub struct HttpWorkoutRepository {
    api: WorkoutsApi,
    executor: RequestExecutor,
}

impl HttpWorkoutRepository {
    pub fn new(api: WorkoutsApi, executor: RequestExecutor) -> Self {
        Self { api, executor }
    }
}

impl WorkoutRepository for HttpWorkoutRepository {
    fn get_workouts_list(&self) -> RemoteStream<Vec<Workout>> {
        let api = self.api.clone();
        self.executor
            .network_request_for_list(move || async move { api.get_workouts().await })
    }
}

/// Bookmarks kept in a [`RecordStore`], keyed by workout id.
#[derive(Debug, Clone)]
pub struct LocalSavedWorkoutRepository<S> {
    store: S,
}

impl<S> LocalSavedWorkoutRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

fn store_error(err: RecordStoreError) -> AppError {
    AppError::Unknown(UnknownAppError::new(err.to_string()))
}

impl<S> SavedWorkoutRepository for LocalSavedWorkoutRepository<S>
where
    S: RecordStore<SavedWorkoutRecord>,
{
    fn save(&self, workout: Workout) -> Result<(), AppError> {
        let key = workout.id.to_string();
        self.store
            .put(&key, SavedWorkoutRecord::from(workout))
            .map_err(store_error)
    }

    fn remove(&self, id: u32) -> Result<(), AppError> {
        match self.store.remove(&id.to_string()) {
            Ok(()) => Ok(()),
            Err(RecordStoreError::NotFound) => {
                debug!(id, "workout was not saved");
                Ok(())
            }
            Err(err) => Err(store_error(err)),
        }
    }

    fn observe_saved(&self, id: u32) -> LocalStream<Option<Workout>> {
        local_request(
            self.store.observe(&id.to_string()),
            DataMapper::<Workout>::map_to_domain,
        )
    }

    fn observe_saved_many(&self, ids: Vec<u32>) -> LocalStream<Vec<Option<Workout>>> {
        let keys: Vec<String> = ids.iter().map(u32::to_string).collect();
        local_request_for_list(
            self.store.observe_many(&keys),
            DataMapper::<Workout>::map_to_domain,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bytes::Bytes;
    use client_core::{Either, NetworkError};
    use client_platform::InMemoryRecordStore;
    use futures::{StreamExt, TryStreamExt};
    use serde_json::json;
    use tokio::{runtime::Handle, time::timeout};
    use url::Url;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    use super::*;
    use crate::{config::HttpClientConfig, transport::HttpTransport};

    async fn single<T>(mut stream: RemoteStream<T>) -> Either<NetworkError, T> {
        timeout(Duration::from_secs(5), stream.next())
            .await
            .expect("request timeout")
            .expect("stream should yield one item")
    }

    fn transport(server: &MockServer) -> HttpTransport {
        let base_url = Url::parse(&server.uri()).expect("mock server uri");
        HttpTransport::new(&HttpClientConfig::new(base_url)).expect("transport should build")
    }

    fn videos(server: &MockServer) -> HttpVideoRepository {
        HttpVideoRepository::new(
            VideoApi::new(transport(server)),
            RequestExecutor::new(Handle::current()),
        )
    }

    fn workouts(server: &MockServer) -> HttpWorkoutRepository {
        HttpWorkoutRepository::new(
            WorkoutsApi::new(transport(server)),
            RequestExecutor::new(Handle::current()),
        )
    }

    #[tokio::test]
    async fn fetches_video_and_resolves_link() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get_video"))
            .and(query_param("id", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 5,
                "duration": 120,
                "link": "/videos/5.mp4"
            })))
            .mount(&server)
            .await;

        let video = match single(videos(&server).get_video_by_id(5)).await {
            Either::Success(video) => video,
            other => panic!("unexpected video result: {other:?}"),
        };
        assert_eq!(video.id, 5);
        assert_eq!(video.duration, 120);
        assert_eq!(video.link, format!("{}/videos/5.mp4", server.uri()));
    }

    #[tokio::test]
    async fn not_found_video_is_an_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get_video"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&server)
            .await;

        assert_eq!(
            single(videos(&server).get_video_by_id(1)).await,
            Either::Failure(NetworkError::api_with_code("not found", 404))
        );
    }

    #[tokio::test]
    async fn server_error_with_empty_body_keeps_empty_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get_workouts"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        assert_eq!(
            single(workouts(&server).get_workouts_list()).await,
            Either::Failure(NetworkError::api_with_code("", 500))
        );
    }

    #[tokio::test]
    async fn empty_success_body_is_reported_as_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get_video"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        assert_eq!(
            single(videos(&server).get_video_by_id(2)).await,
            Either::Failure(NetworkError::EmptyBody)
        );
    }

    #[tokio::test]
    async fn undecodable_body_is_unexpected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get_workouts"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[{\"id\":"))
            .mount(&server)
            .await;

        match single(workouts(&server).get_workouts_list()).await {
            Either::Failure(NetworkError::Unexpected { message }) => {
                assert!(message.starts_with("failed to decode response body"), "{message}");
            }
            other => panic!("unexpected workouts result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn workout_list_keeps_server_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get_workouts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 3, "title": "C", "type": 1, "duration": 10 },
                { "id": 1, "title": "A", "description": "warm-up", "type": 2, "duration": "5" },
                { "id": 2, "title": "B", "type": 1, "duration": "40-45" }
            ])))
            .mount(&server)
            .await;

        let list = match single(workouts(&server).get_workouts_list()).await {
            Either::Success(list) => list,
            other => panic!("unexpected workouts result: {other:?}"),
        };
        let titles: Vec<&str> = list.iter().map(|workout| workout.title.as_str()).collect();
        assert_eq!(titles, vec!["C", "A", "B"]);
        assert_eq!(list[0].duration, "10");
        assert_eq!(list[2].duration, "40-45");
    }

    #[tokio::test]
    async fn opens_video_as_byte_stream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos/5.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"frames".to_vec()))
            .mount(&server)
            .await;

        let video = Video {
            id: 5,
            duration: 1,
            link: format!("{}/videos/5.mp4", server.uri()),
        };
        let body = match single(videos(&server).open_video(&video)).await {
            Either::Success(body) => body,
            Either::Failure(err) => panic!("unexpected failure: {err:?}"),
        };
        let chunks: Vec<Bytes> = body.try_collect().await.expect("payload should stream");
        assert_eq!(chunks.concat(), b"frames".to_vec());
    }

    fn workout(id: u32) -> Workout {
        Workout {
            id,
            title: format!("Workout {id}"),
            description: Some("saved".into()),
            workout_type: 1,
            duration: "30".into(),
        }
    }

    #[tokio::test]
    async fn saved_workouts_are_observed_continuously() {
        let repository =
            LocalSavedWorkoutRepository::new(InMemoryRecordStore::<SavedWorkoutRecord>::default());
        let mut saved = repository.observe_saved_many(vec![4, 8]);
        let first = timeout(Duration::from_secs(2), saved.next())
            .await
            .expect("observation timeout");
        assert_eq!(first, Some(vec![None, None]));

        repository.save(workout(8)).expect("save should succeed");
        let second = timeout(Duration::from_secs(2), saved.next())
            .await
            .expect("observation timeout");
        assert_eq!(second, Some(vec![None, Some(workout(8))]));

        repository.remove(8).expect("remove should succeed");
        repository.remove(8).expect("removing twice is not an error");
    }

    #[tokio::test]
    async fn single_saved_workout_starts_absent() {
        let repository =
            LocalSavedWorkoutRepository::new(InMemoryRecordStore::<SavedWorkoutRecord>::default());
        let mut saved = repository.observe_saved(4);
        let first = timeout(Duration::from_secs(2), saved.next())
            .await
            .expect("observation timeout");
        assert_eq!(first, Some(None));
    }
}
