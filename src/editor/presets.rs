//! 固定指令与一键编辑预设。

use serde::Serialize;

/// 擦除：图片 + 蒙版一起发送，蒙版标出需要移除的区域。
pub const ERASE_INSTRUCTION: &str = "Inpaint the area indicated by the second image (the mask). \
The mask shows the region to be removed and filled in. \
Fill this area seamlessly to match the surrounding background.";

/// 扩展：去掉纯绿填充并把画面延展到整张画布。
pub const EXTEND_INSTRUCTION: &str = "Remove the solid green background and extend the central \
image to fill the entire canvas seamlessly and realistically.";

/// 局部重绘：纯绿区域替换为用户描述的内容。
pub fn inpaint_instruction(description: &str) -> String {
    format!(
        "In the following image, replace the solid green area with: \"{}\". \
Make sure to blend it seamlessly and realistically with the rest of the image.",
        description.trim()
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuickEdit {
    pub id: &'static str,
    pub name: &'static str,
    pub prompt: &'static str,
}

pub static QUICK_EDITS: [QuickEdit; 3] = [
    QuickEdit {
        id: "enhance",
        name: "Enhance",
        prompt: "Enhance the photo with better lighting, sharpness, and clarity. Make it look more professional.",
    },
    QuickEdit {
        id: "vibrant",
        name: "Vibrant",
        prompt: "Make the colors in this image more vibrant and saturated. Boost the contrast.",
    },
    QuickEdit {
        id: "portrait",
        name: "Portrait",
        prompt: "Turn this into a professional portrait. Soften the background to create a bokeh effect and enhance the facial features.",
    },
];

impl QuickEdit {
    pub fn find(id: &str) -> Option<&'static QuickEdit> {
        QUICK_EDITS.iter().find(|edit| edit.id == id)
    }
}
