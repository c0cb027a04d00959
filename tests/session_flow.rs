use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::Rgba;
use magic_canvas::editor::{
    EXTEND_INSTRUCTION, EditorConfig, EditorSession, GenerativeModel, NoticePolicy,
};
use magic_canvas::raster::{
    Bitmap, BitmapCodec, DisplayRect, MARKER_COLOR, MediaType, RasterConfig, RasterError, Surface,
};
use magic_canvas::tools::ToolMode;
use magic_canvas::EditorError;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn solid_png(width: u32, height: u32) -> Bitmap {
    BitmapCodec::new(RasterConfig::default())
        .encode(&Surface::from_pixel(width, height, Rgba([90, 120, 200, 255])), MediaType::Png)
        .expect("encode fixture")
}

/// 记录每次调用的假模型。
#[derive(Default)]
struct FakeModel {
    edits: AtomicUsize,
    erases: AtomicUsize,
    suggests: AtomicUsize,
    sent: Mutex<Vec<(Bitmap, String)>>,
    edit_error: Option<fn() -> EditorError>,
    suggest_error: bool,
}

impl GenerativeModel for FakeModel {
    async fn edit(&self, image: &Bitmap, instruction: &str) -> Result<Bitmap, EditorError> {
        self.edits.fetch_add(1, Ordering::SeqCst);
        self.sent
            .lock()
            .expect("lock")
            .push((image.clone(), instruction.to_string()));
        match self.edit_error {
            Some(make) => Err(make()),
            None => Ok(solid_png(3, 3)),
        }
    }

    async fn erase(
        &self,
        image: &Bitmap,
        _mask: &Bitmap,
        instruction: &str,
    ) -> Result<Bitmap, EditorError> {
        self.erases.fetch_add(1, Ordering::SeqCst);
        self.sent
            .lock()
            .expect("lock")
            .push((image.clone(), instruction.to_string()));
        Ok(solid_png(3, 3))
    }

    async fn suggest(&self, _image: &Bitmap) -> Result<Vec<String>, EditorError> {
        self.suggests.fetch_add(1, Ordering::SeqCst);
        if self.suggest_error {
            return Err(EditorError::QuotaExceeded("per-minute".into()));
        }
        Ok(vec!["Add a rainbow".into()])
    }

    async fn generate(&self, _prompt: &str, _aspect: &str) -> Result<Bitmap, EditorError> {
        Ok(solid_png(32, 18))
    }
}

async fn loaded(model: FakeModel, config: EditorConfig) -> EditorSession<FakeModel> {
    init_logger();
    let mut session = EditorSession::new(model, config).expect("session");
    session.load_image(solid_png(800, 600)).await.expect("load");
    session.resize_display(DisplayRect {
        left: 0.0,
        top: 0.0,
        width: 400,
        height: 300,
    })
    .expect("resize");
    session
}

#[tokio::test]
async fn blank_mask_apply_calls_nothing() {
    let mut session = loaded(FakeModel::default(), EditorConfig::default()).await;
    session.start_erase();

    session.apply_mask().await.expect("blank apply is a no-op");

    let model = session.model();
    assert_eq!(model.edits.load(Ordering::SeqCst), 0);
    assert_eq!(model.erases.load(Ordering::SeqCst), 0);
    assert_eq!(session.tool_mode(), ToolMode::Erase);
    assert!(session.edited().is_none());
}

#[tokio::test]
async fn failing_suggestions_degrade_silently() {
    let session = loaded(
        FakeModel {
            suggest_error: true,
            ..Default::default()
        },
        EditorConfig::default(),
    )
    .await;

    assert!(session.suggestions().is_empty());
    assert!(session.notice().is_none());
    assert_eq!(session.model().suggests.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failing_edit_sets_notice_and_clears_loading() {
    let mut session = loaded(
        FakeModel {
            edit_error: Some(|| EditorError::EmptyResponse),
            ..Default::default()
        },
        EditorConfig::default(),
    )
    .await;

    let result = session.edit("add snow").await;

    assert!(matches!(result, Err(EditorError::EmptyResponse)));
    assert!(!session.is_loading());
    assert_eq!(session.notice().map(|n| n.code), Some("empty_response"));
    assert!(session.controls().erase_enabled);
}

#[tokio::test]
async fn second_request_while_loading_is_busy() {
    let mut session = loaded(FakeModel::default(), EditorConfig::default()).await;
    let flag = session.loading_flag();
    let held = flag.try_acquire().expect("acquire");

    let result = session.quick_edit("vibrant").await;

    assert!(matches!(result, Err(EditorError::Busy)));
    assert_eq!(session.model().edits.load(Ordering::SeqCst), 0);
    assert!(!session.controls().erase_enabled);

    drop(held);
    session.quick_edit("vibrant").await.expect("edit after release");
    assert_eq!(session.model().edits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn extend_pads_to_ratio_with_centered_source() {
    let mut session = loaded(FakeModel::default(), EditorConfig::default()).await;
    session.start_extend();
    assert!(session.controls().aspect_choices_visible);

    session.extend("16:9").await.expect("extend");

    let sent = session.model().sent.lock().expect("lock").clone();
    let (padded, instruction) = sent.last().expect("one request");
    assert_eq!(instruction, EXTEND_INSTRUCTION);
    assert_eq!(padded.dimensions(), (1067, 600));

    let surface = session.codec().decode(padded).expect("decode padded");
    assert_eq!(*surface.get_pixel(0, 300), MARKER_COLOR);
    assert_eq!(*surface.get_pixel(132, 300), MARKER_COLOR);
    assert_eq!(*surface.get_pixel(133, 300), Rgba([90, 120, 200, 255]));
    assert_eq!(*surface.get_pixel(932, 300), Rgba([90, 120, 200, 255]));
    assert_eq!(*surface.get_pixel(933, 300), MARKER_COLOR);

    assert_eq!(session.tool_mode(), ToolMode::None);
    assert_eq!(session.edited().map(Bitmap::dimensions), Some((3, 3)));
}

#[tokio::test]
async fn extend_beyond_memory_budget_fails_before_rendering() {
    let config = EditorConfig {
        raster: RasterConfig {
            max_decoded_pixels: 1_000_000,
            ..Default::default()
        },
        ..Default::default()
    };
    let mut session = loaded(FakeModel::default(), config).await;

    // 800x600 -> 9:16 需要 800x1422 的画布，超过 100 万像素
    let result = session.extend("9:16").await;

    assert!(matches!(
        result,
        Err(EditorError::Raster(RasterError::ResourceLimit(_)))
    ));
    assert_eq!(session.model().edits.load(Ordering::SeqCst), 0);
    assert_eq!(session.notice().map(|n| n.code), Some("resource_limit"));
    assert!(!session.is_loading());
    assert_eq!(session.tool_mode(), ToolMode::None);

    session.extend("4:3").await.expect("same-ratio extend fits the budget");
    assert_eq!(session.model().edits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn extend_with_unknown_ratio_is_rejected() {
    let mut session = loaded(FakeModel::default(), EditorConfig::default()).await;

    let result = session.extend("21:9").await;

    assert!(matches!(result, Err(EditorError::Raster(_))));
    assert_eq!(session.model().edits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn inpaint_composites_marker_at_source_resolution() {
    let mut session = loaded(FakeModel::default(), EditorConfig::default()).await;
    session.start_inpaint();
    session.set_inpaint_prompt("a hot air balloon");
    session.set_brush_size(20.0);
    assert!(session.pointer_down(100.0, 100.0));
    assert!(session.pointer_move(120.0, 100.0));
    session.pointer_up();

    session.apply_mask().await.expect("inpaint");

    let sent = session.model().sent.lock().expect("lock").clone();
    let (marked, instruction) = sent.last().expect("one request");
    assert!(instruction.contains("\"a hot air balloon\""));
    assert_eq!(marked.dimensions(), (800, 600));

    // 显示分辨率是原图的一半，(110, 100) 对应原图 (220, 200)
    let surface = session.codec().decode(marked).expect("decode marked");
    assert_eq!(*surface.get_pixel(220, 200), MARKER_COLOR);
    assert_eq!(*surface.get_pixel(700, 500), Rgba([90, 120, 200, 255]));
    assert!(session.painter().is_blank());
}

#[tokio::test]
async fn queued_notices_surface_one_at_a_time() {
    let config = EditorConfig {
        notice_policy: NoticePolicy::Queue,
        ..Default::default()
    };
    let mut session = loaded(FakeModel::default(), config).await;
    session.start_inpaint();
    session.pointer_down(50.0, 50.0);
    session.pointer_up();

    let _ = session.apply_mask().await;
    let _ = session.extend("2:1").await;

    assert_eq!(session.notice().map(|n| n.code), Some("missing_prompt"));
    session.dismiss_notice();
    assert_eq!(session.notice().map(|n| n.code), Some("invalid_format"));
    session.dismiss_notice();
    assert!(session.notice().is_none());
}

#[tokio::test]
async fn switching_tools_discards_the_mask() {
    let mut session = loaded(FakeModel::default(), EditorConfig::default()).await;
    session.start_erase();
    session.pointer_down(10.0, 10.0);
    session.pointer_up();
    assert!(!session.painter().is_blank());

    session.start_inpaint();

    assert!(session.painter().is_blank());
    assert!(session.painter().is_armed());

    session.cancel_drawing();
    assert!(!session.painter().is_armed());
    assert!(!session.pointer_down(10.0, 10.0));
}
