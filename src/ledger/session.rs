use base64::{engine::general_purpose, Engine as _};
use tracing::{info, warn};

use super::quantity::MacroSplit;
use super::scan_log::{ScanLog, ScanLogEntry};
use crate::analysis::dto::{AnalysisContext, NutritionRecord};
use crate::client::{AnalyzeClient, ImageFile};

/// What occupies the upload slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveUpload {
    Selected(ImageFile),
    /// Zero-byte marker left by a history restore so "a file is present"
    /// stays true. It carries no image data and cannot be re-analyzed.
    Placeholder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzeOutcome {
    NoFile,
    /// The slot holds a restored placeholder, not real bytes.
    NothingToSend,
    Analyzed,
    Failed,
}

/// The interactive session: active view plus the scan ledger. Owned by a
/// single task, so plain `&mut self` methods suffice.
#[derive(Debug, Default)]
pub struct Session {
    file: Option<ActiveUpload>,
    preview: Option<String>,
    result: Option<NutritionRecord>,
    error: Option<String>,
    loading: bool,
    context: AnalysisContext,
    log: ScanLog,
}

fn preview_for(file: &ImageFile) -> String {
    format!(
        "data:{};base64,{}",
        file.content_type,
        general_purpose::STANDARD.encode(&file.bytes)
    )
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(&self) -> Option<&ActiveUpload> {
        self.file.as_ref()
    }

    pub fn has_file(&self) -> bool {
        self.file.is_some()
    }

    pub fn preview(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    pub fn result(&self) -> Option<&NutritionRecord> {
        self.result.as_ref()
    }

    /// Macro grams of the shown result, for the breakdown chart.
    pub fn result_macros(&self) -> Option<MacroSplit> {
        self.result.as_ref().map(MacroSplit::from_record)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// True while a submission is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn context(&self) -> &AnalysisContext {
        &self.context
    }

    pub fn log(&self) -> &ScanLog {
        &self.log
    }

    pub fn daily_total(&self) -> i64 {
        self.log.daily_total()
    }

    pub fn set_meal_type(&mut self, meal_type: impl Into<String>) {
        self.context.meal_type = meal_type.into();
    }

    pub fn set_diet_goal(&mut self, diet_goal: impl Into<String>) {
        self.context.diet_goal = diet_goal.into();
    }

    /// File picker: any file is taken as-is.
    pub fn select_file(&mut self, file: ImageFile) {
        self.preview = Some(preview_for(&file));
        self.file = Some(ActiveUpload::Selected(file));
        self.result = None;
        self.error = None;
    }

    /// Drag and drop: only `image/*` is accepted.
    pub fn drop_file(&mut self, file: ImageFile) -> bool {
        if !file.is_image() {
            return false;
        }
        self.select_file(file);
        true
    }

    /// Resets the active view. The log is left alone.
    pub fn clear(&mut self) {
        self.file = None;
        self.preview = None;
        self.result = None;
        self.error = None;
        self.context = AnalysisContext::default();
    }

    pub fn append_scan(&mut self, record: NutritionRecord) -> &ScanLogEntry {
        self.log.append(record, self.preview.clone(), &self.context)
    }

    /// Shows a past entry again. Returns false for an unknown id.
    pub fn restore_from_history(&mut self, id: i64) -> bool {
        let Some(entry) = self.log.get(id).cloned() else {
            return false;
        };
        self.result = Some(entry.record);
        self.preview = entry.image_preview;
        self.context = AnalysisContext {
            meal_type: entry.meal_context,
            diet_goal: entry.goal_context,
        };
        self.file = Some(ActiveUpload::Placeholder);
        true
    }

    /// Submits the selected file with the current context.
    pub async fn analyze(&mut self, client: &AnalyzeClient) -> AnalyzeOutcome {
        let file = match &self.file {
            None => return AnalyzeOutcome::NoFile,
            Some(ActiveUpload::Placeholder) => return AnalyzeOutcome::NothingToSend,
            Some(ActiveUpload::Selected(file)) => file.clone(),
        };
        self.error = None;
        self.loading = true;

        let submitted = client.submit(&file, &self.context).await;
        self.loading = false;

        match submitted {
            Ok(reply) => {
                let record = NutritionRecord::from_reply(&reply);
                self.result = Some(record.clone());
                let entry = self.append_scan(record);
                info!(id = entry.id, "scan added to session log");
                AnalyzeOutcome::Analyzed
            }
            Err(e) => {
                warn!(error = %e, "analysis failed");
                self.error = Some(e.to_string());
                AnalyzeOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use super::*;
    use crate::{
        inference::{testing::CannedBackend, InferenceClient},
        state::AppState,
        storage::testing::MemoryStore,
    };

    async fn spawn_server(store: Arc<MemoryStore>, inference: InferenceClient) -> SocketAddr {
        let app = crate::app::build_app(AppState::fake(store, inference));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn client_for(addr: SocketAddr) -> AnalyzeClient {
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        AnalyzeClient::with_http(http, &format!("http://{addr}"))
    }

    fn jpeg() -> ImageFile {
        ImageFile::new("pizza.jpg", "image/jpeg", vec![0xffu8, 0xd8, 0xff])
    }

    fn record(name: &str, calories: &str) -> NutritionRecord {
        NutritionRecord {
            food_name: Some(name.into()),
            calories: Some(calories.into()),
            ..NutritionRecord::default()
        }
    }

    #[test]
    fn starts_with_default_context_and_empty_log() {
        let session = Session::new();
        assert_eq!(session.context().meal_type, "Unspecified");
        assert_eq!(session.context().diet_goal, "General Health");
        assert!(session.log().is_empty());
        assert!(!session.has_file());
        assert!(!session.is_loading());
        assert_eq!(session.daily_total(), 0);
    }

    #[test]
    fn select_file_sets_preview_and_clears_result() {
        let mut session = Session::new();
        session.append_scan(record("old", "1"));
        session.restore_from_history(session.log().latest().unwrap().id);
        assert!(session.result().is_some());

        session.select_file(jpeg());
        assert_eq!(session.preview(), Some("data:image/jpeg;base64,/9j/"));
        assert!(session.result().is_none());
        assert!(matches!(session.file(), Some(ActiveUpload::Selected(_))));
    }

    #[test]
    fn drop_rejects_non_images() {
        let mut session = Session::new();
        assert!(!session.drop_file(ImageFile::new("notes.txt", "text/plain", vec![1u8])));
        assert!(!session.has_file());
        assert!(session.drop_file(jpeg()));
        assert!(session.has_file());
    }

    #[test]
    fn clear_resets_view_but_keeps_log() {
        let mut session = Session::new();
        session.select_file(jpeg());
        session.set_meal_type("Dinner");
        session.set_diet_goal("Muscle Gain");
        session.append_scan(record("Steak", "600 kcal"));

        session.clear();

        assert!(!session.has_file());
        assert!(session.preview().is_none());
        assert!(session.result().is_none());
        assert!(session.error().is_none());
        assert_eq!(session.context(), &AnalysisContext::default());
        assert_eq!(session.log().len(), 1);
        assert_eq!(session.daily_total(), 600);
    }

    #[test]
    fn restore_brings_back_result_preview_and_context() {
        let mut session = Session::new();
        session.select_file(jpeg());
        session.set_meal_type("Dinner");
        session.set_diet_goal("Keto / Low Carb");
        let id = session.append_scan(record("Pizza Slice", "285 kcal")).id;
        let preview = session.preview().map(str::to_string);

        session.clear();
        assert!(session.restore_from_history(id));

        assert_eq!(session.result().unwrap().food_name.as_deref(), Some("Pizza Slice"));
        assert_eq!(session.preview().map(str::to_string), preview);
        assert_eq!(session.context().meal_type, "Dinner");
        assert_eq!(session.context().diet_goal, "Keto / Low Carb");
        assert_eq!(session.file(), Some(&ActiveUpload::Placeholder));
        assert!(!session.restore_from_history(id + 1_000_000));
    }

    #[tokio::test]
    async fn analyze_without_real_bytes_sends_nothing() {
        // nothing listens here; a request would fail
        let client = AnalyzeClient::new("http://127.0.0.1:9").unwrap();
        let mut session = Session::new();
        assert_eq!(session.analyze(&client).await, AnalyzeOutcome::NoFile);

        session.append_scan(record("Soup", "120 kcal"));
        let id = session.log().latest().unwrap().id;
        session.restore_from_history(id);
        assert_eq!(session.analyze(&client).await, AnalyzeOutcome::NothingToSend);
        assert_eq!(session.log().len(), 1);
    }

    #[tokio::test]
    async fn analyze_appends_the_reply_with_its_context() {
        let store = Arc::new(MemoryStore::default());
        let backend = Arc::new(CannedBackend::replying(
            r#"{"foodName":"Pizza Slice","calories":"285 kcal","proteins":"12g","carbs":"36g","fats":"10g","description":"A cheesy slice.","warnings":["High carbs for a Keto dinner"]}"#,
        ));
        let addr = spawn_server(store.clone(), InferenceClient::Live(backend)).await;
        let client = client_for(addr);

        let mut session = Session::new();
        session.select_file(jpeg());
        session.set_meal_type("Dinner");
        session.set_diet_goal("Keto / Low Carb");

        assert_eq!(session.analyze(&client).await, AnalyzeOutcome::Analyzed);
        assert!(!session.is_loading());

        let result = session.result().unwrap();
        assert_eq!(result.food_name.as_deref(), Some("Pizza Slice"));
        assert_eq!(result.warnings, vec!["High carbs for a Keto dinner"]);
        let entry = session.log().latest().unwrap();
        assert_eq!(entry.meal_context, "Dinner");
        assert_eq!(entry.goal_context, "Keto / Low Carb");
        assert_eq!(entry.image_preview.as_deref(), session.preview());
        assert_eq!(session.daily_total(), 285);
        assert_eq!(
            session.result_macros(),
            Some(MacroSplit {
                proteins: 12,
                carbs: 36,
                fats: 10
            })
        );
        assert!(session.error().is_none());
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn analyze_failure_sets_error_and_leaves_log_alone() {
        let store = Arc::new(MemoryStore::default());
        let addr = spawn_server(store.clone(), InferenceClient::Unavailable).await;
        let client = client_for(addr);

        let mut session = Session::new();
        session.select_file(jpeg());

        assert_eq!(session.analyze(&client).await, AnalyzeOutcome::Failed);
        assert!(!session.is_loading());
        assert!(session.result_macros().is_none());
        assert!(session.error().unwrap().starts_with("Failed to analyze image."));
        assert!(session.result().is_none());
        assert!(session.log().is_empty());
        assert_eq!(store.len(), 0);
    }
}
