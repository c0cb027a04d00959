//! # 外部协作方
//!
//! 生成式图像模型与相机都是会话之外的不透明服务，这里只约定接口。
//! 所有方法都是单结果的 Future：要么成功一次，要么失败一次，会话不会取消它们。

use std::future::Future;

use crate::error::EditorError;
use crate::raster::Bitmap;

/// 托管的生成式图像模型。
pub trait GenerativeModel {
    /// 自由文本编辑。
    fn edit(
        &self,
        image: &Bitmap,
        instruction: &str,
    ) -> impl Future<Output = Result<Bitmap, EditorError>> + Send;

    /// 图片 + 蒙版一起发送的擦除请求，蒙版与图片同分辨率。
    fn erase(
        &self,
        image: &Bitmap,
        mask: &Bitmap,
        instruction: &str,
    ) -> impl Future<Output = Result<Bitmap, EditorError>> + Send;

    /// 针对图片给出简短的编辑建议。
    fn suggest(&self, image: &Bitmap)
    -> impl Future<Output = Result<Vec<String>, EditorError>> + Send;

    /// 文生图，`aspect_tag` 形如 `16:9`。
    fn generate(
        &self,
        prompt: &str,
        aspect_tag: &str,
    ) -> impl Future<Output = Result<Bitmap, EditorError>> + Send;
}

/// 相机拍到的一帧。
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub bytes: Vec<u8>,
    pub media_type: String,
}

/// 相机等采集设备。权限被拒或设备不可用时返回 `CaptureUnavailable`。
pub trait CaptureDevice {
    fn capture(&mut self) -> impl Future<Output = Result<CapturedFrame, EditorError>> + Send;
}
