pub mod config;
pub mod processing;
pub mod templates;

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use axum::{
    Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use config::AppConfig;
use processing::{
    DistanceUnit, FitProcessError, ProcessingOptions, inspect_fit_bytes, pace_to_speed,
    parse_pace_list, process_fit_bytes,
};
use templates::{render_landing_page, render_lap_overview, render_processed_records};
use uuid::Uuid;

/// A rewritten file waiting to be downloaded.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Bounded in-memory store of rewritten files; the oldest entry is evicted
/// once `capacity` is reached.
#[derive(Debug)]
pub struct DownloadStore {
    capacity: usize,
    order: VecDeque<Uuid>,
    files: HashMap<Uuid, StoredFile>,
}

impl DownloadStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            order: VecDeque::new(),
            files: HashMap::new(),
        }
    }

    pub fn insert(&mut self, file: StoredFile) -> Uuid {
        while self.order.len() >= self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.files.remove(&evicted);
                tracing::debug!(%evicted, "evicted stored download");
            }
        }

        let id = Uuid::new_v4();
        self.order.push_back(id);
        self.files.insert(id, file);
        id
    }

    pub fn get(&self, id: &Uuid) -> Option<StoredFile> {
        self.files.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[derive(Debug)]
pub struct AppState {
    pub config: AppConfig,
    downloads: Mutex<DownloadStore>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let downloads = Mutex::new(DownloadStore::new(config.max_downloads));
        Self { config, downloads }
    }

    fn store(&self, file: StoredFile) -> Uuid {
        self.downloads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(file)
    }

    fn fetch(&self, id: &Uuid) -> Option<StoredFile> {
        self.downloads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
    }
}

pub fn build_app(config: AppConfig) -> Router {
    let body_limit = config.max_upload_bytes;
    let state = Arc::new(AppState::new(config));

    Router::new()
        .route("/", get(landing_page))
        .route("/inspect", post(handle_inspect))
        .route("/upload", post(handle_upload))
        .route("/download/:id", get(handle_download))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

async fn landing_page() -> Html<String> {
    Html(render_landing_page())
}

/// Fields of the upload form. Text fields are kept raw until the whole form
/// has been read.
#[derive(Debug, Default)]
struct UploadForm {
    file: Option<(String, Vec<u8>)>,
    pace: String,
    lap_paces: String,
    unit: String,
    autolap: bool,
    keep_laps: bool,
}

impl UploadForm {
    fn unit(&self) -> Result<DistanceUnit, FitProcessError> {
        if self.unit.trim().is_empty() {
            return Ok(DistanceUnit::default());
        }
        DistanceUnit::from_form_value(&self.unit).ok_or_else(|| {
            FitProcessError::InvalidConfiguration(format!("unknown distance unit {:?}", self.unit))
        })
    }

    fn options(&self, config: &AppConfig) -> Result<ProcessingOptions, FitProcessError> {
        let unit = self.unit()?;
        let speed = match self.pace.trim() {
            "" => None,
            pace => Some(pace_to_speed(pace, unit.meters())?),
        };
        let speeds = match self.lap_paces.trim() {
            "" => None,
            paces => Some(parse_pace_list(paces, unit.meters())?),
        };
        let auto_lap_distance = match unit {
            DistanceUnit::Kilometer => config.auto_lap_meters,
            DistanceUnit::Mile => unit.meters(),
        };

        Ok(ProcessingOptions {
            speed,
            speeds,
            autolap: self.autolap,
            keep_laps: self.keep_laps,
            auto_lap_distance,
        })
    }
}

fn is_checked(value: &str) -> bool {
    value == "true" || value == "on"
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, Response> {
    let mut form = UploadForm::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                return Err((err.status(), format!("Failed to read form: {err}")).into_response());
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let file_name = field.file_name().unwrap_or("activity.fit").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|err| {
                    (err.status(), format!("Failed to read uploaded file: {err}")).into_response()
                })?;
            form.file = Some((file_name, bytes.to_vec()));
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|err| bad_request(format!("Failed to read field {name}: {err}")))?;
        match name.as_str() {
            "pace" => form.pace = value,
            "lap_paces" => form.lap_paces = value,
            "unit" => form.unit = value,
            "autolap" => form.autolap = is_checked(&value),
            "keep_laps" => form.keep_laps = is_checked(&value),
            _ => {}
        }
    }

    Ok(form)
}

async fn handle_inspect(multipart: Multipart) -> Response {
    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(response) => return response,
    };
    let Some((file_name, bytes)) = &form.file else {
        return bad_request("No file provided");
    };
    let unit = match form.unit() {
        Ok(unit) => unit,
        Err(err) => return render_processing_error(err),
    };

    match inspect_fit_bytes(bytes) {
        Ok(inspected) => {
            tracing::info!(file = %file_name, laps = inspected.laps.len(), "inspected upload");
            Html(render_lap_overview(&inspected, unit)).into_response()
        }
        Err(err) => render_processing_error(err),
    }
}

async fn handle_upload(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(response) => return response,
    };
    let Some((file_name, bytes)) = &form.file else {
        return bad_request("No file provided");
    };

    let result = form.unit().and_then(|unit| {
        let options = form.options(&state.config)?;
        let processed = process_fit_bytes(bytes, &options)?;
        Ok((unit, processed))
    });

    match result {
        Ok((unit, processed)) => {
            let id = state.store(StoredFile {
                file_name: adjusted_file_name(file_name),
                bytes: Bytes::from(processed.processed_bytes.clone()),
            });
            tracing::info!(file = %file_name, %id, "stored rewritten activity");
            Html(render_processed_records(
                &processed,
                &format!("/download/{id}"),
                unit,
            ))
            .into_response()
        }
        Err(err) => {
            tracing::debug!(file = %file_name, error = %err, "rejected upload");
            render_processing_error(err)
        }
    }
}

async fn handle_download(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    let Some(file) = Uuid::parse_str(&id).ok().and_then(|id| state.fetch(&id)) else {
        return (StatusCode::NOT_FOUND, "Download not found").into_response();
    };

    (
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.file_name),
            ),
        ],
        file.bytes,
    )
        .into_response()
}

/// `<stem>_adjusted.fit`, restricted to characters that are safe in a
/// `Content-Disposition` header.
pub fn adjusted_file_name(original: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let stem = match base.rsplit_once('.') {
        Some((stem, extension)) if extension.eq_ignore_ascii_case("fit") => stem,
        _ => base,
    };

    let cleaned: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('.');

    if cleaned.is_empty() {
        "activity_adjusted.fit".to_string()
    } else {
        format!("{cleaned}_adjusted.fit")
    }
}

fn bad_request(message: impl Into<String>) -> Response {
    (StatusCode::BAD_REQUEST, message.into()).into_response()
}

fn render_processing_error(error: FitProcessError) -> Response {
    bad_request(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(name: &str) -> StoredFile {
        StoredFile {
            file_name: name.to_string(),
            bytes: Bytes::from_static(b"fit"),
        }
    }

    #[test]
    fn store_evicts_oldest_download() {
        let mut store = DownloadStore::new(2);
        let first = store.insert(stored("a"));
        let second = store.insert(stored("b"));
        let third = store.insert(stored("c"));

        assert_eq!(store.len(), 2);
        assert!(store.get(&first).is_none());
        assert_eq!(store.get(&second).map(|file| file.file_name), Some("b".into()));
        assert_eq!(store.get(&third).map(|file| file.file_name), Some("c".into()));
    }

    #[test]
    fn adjusted_names_keep_the_stem() {
        assert_eq!(adjusted_file_name("Morning Run.FIT"), "Morning_Run_adjusted.fit");
        assert_eq!(adjusted_file_name("C:\\runs\\123.fit"), "123_adjusted.fit");
        assert_eq!(adjusted_file_name("track.v2.fit"), "track.v2_adjusted.fit");
        assert_eq!(adjusted_file_name("\"\".fit"), "___adjusted.fit");
        assert_eq!(adjusted_file_name(".fit"), "activity_adjusted.fit");
    }

    #[test]
    fn form_paces_become_speeds() {
        let form = UploadForm {
            pace: "05:00".into(),
            unit: "km".into(),
            autolap: true,
            ..Default::default()
        };
        let options = form.options(&AppConfig::default()).expect("valid form");
        assert_eq!(options.speed, Some(1000.0 / 300.0));
        assert!(options.autolap);
        assert_eq!(options.auto_lap_distance, 1000.0);

        let form = UploadForm {
            lap_paces: "08:00, 00:00".into(),
            unit: "mi".into(),
            ..Default::default()
        };
        let options = form.options(&AppConfig::default()).expect("valid form");
        assert_eq!(options.speeds, Some(vec![1609.34 / 480.0, 0.0]));
        assert_eq!(options.auto_lap_distance, 1609.34);
    }

    #[test]
    fn malformed_pace_is_reported() {
        let form = UploadForm {
            pace: "5:7".into(),
            ..Default::default()
        };
        assert!(matches!(
            form.options(&AppConfig::default()),
            Err(FitProcessError::InvalidFormat(_))
        ));
    }
}
