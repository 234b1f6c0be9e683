//! Static model and prompt tables served to the front end

use serde::Serialize;

/// Normalization strategy a model belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFamily {
    /// Distilled few-step model: prompt and step count only
    Fast,
    ImageToImage,
    Inpainting,
    TextToImage,
}

impl ModelFamily {
    pub const fn requires_image(self) -> bool {
        matches!(self, ModelFamily::ImageToImage | ModelFamily::Inpainting)
    }

    pub const fn requires_mask(self) -> bool {
        matches!(self, ModelFamily::Inpainting)
    }
}

/// One selectable inference backend model
#[derive(Debug, Clone, Serialize)]
pub struct ModelDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// Workers AI model key
    pub key: &'static str,
    #[serde(rename = "requiresImage")]
    pub requires_image: bool,
    #[serde(rename = "requiresMask", skip_serializing_if = "std::ops::Not::not")]
    pub requires_mask: bool,
    #[serde(skip)]
    pub family: ModelFamily,
}

const fn descriptor(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    key: &'static str,
    family: ModelFamily,
) -> ModelDescriptor {
    ModelDescriptor {
        id,
        name,
        description,
        key,
        requires_image: family.requires_image(),
        requires_mask: family.requires_mask(),
        family,
    }
}

pub static MODELS: &[ModelDescriptor] = &[
    descriptor(
        "stable-diffusion-xl-base-1.0",
        "Stable Diffusion XL Base 1.0",
        "Stability AI SDXL 文生图模型",
        "@cf/stabilityai/stable-diffusion-xl-base-1.0",
        ModelFamily::TextToImage,
    ),
    descriptor(
        "flux-1-schnell",
        "FLUX.1 [schnell]",
        "精确细节表现的高性能文生图模型",
        "@cf/black-forest-labs/flux-1-schnell",
        ModelFamily::Fast,
    ),
    descriptor(
        "dreamshaper-8-lcm",
        "DreamShaper 8 LCM",
        "增强图像真实感的 SD 微调模型",
        "@cf/lykon/dreamshaper-8-lcm",
        ModelFamily::TextToImage,
    ),
    descriptor(
        "stable-diffusion-xl-lightning",
        "Stable Diffusion XL Lightning",
        "更加高效的文生图模型",
        "@cf/bytedance/stable-diffusion-xl-lightning",
        ModelFamily::TextToImage,
    ),
    descriptor(
        "stable-diffusion-v1-5-img2img",
        "Stable Diffusion v1.5 图生图",
        "将输入图像风格化或变换（需要提供图像URL）",
        "@cf/runwayml/stable-diffusion-v1-5-img2img",
        ModelFamily::ImageToImage,
    ),
    descriptor(
        "stable-diffusion-v1-5-inpainting",
        "Stable Diffusion v1.5 局部重绘",
        "根据遮罩对局部区域进行重绘（需要图像URL，可选遮罩URL）",
        "@cf/runwayml/stable-diffusion-v1-5-inpainting",
        ModelFamily::Inpainting,
    ),
];

pub static PROMPTS: &[&str] = &[
    "赛博朋克风城市夜景，霓虹灯雨夜街道，反光地面，强烈对比度，广角镜头，电影感",
    "清晨森林小径，阳光穿过树叶薄雾弥漫，柔和光线，高饱和度，超清细节",
    "水墨山水，远山近水小桥人家，留白构图，国画风格，淡雅色调",
    "可爱橘猫坐在窗台，落日与晚霞，暖色调，浅景深，柔焦",
    "科幻机甲战士，蓝色能量核心，强烈光影，硬边金属质感，战损细节",
    "复古胶片风人像，暖色调，轻微颗粒，高光溢出，自然肤色，50mm",
    "海边灯塔与星空，银河拱桥，长曝光，拍岸浪花，清冷色调",
    "蒸汽朋克飞船穿越云层，黄铜齿轮与管道，体积光，戏剧化天空",
    "古风少女立于竹林，微风拂过衣袂，侧光，国风写意，细腻材质",
    "极光下雪原与麋鹿，宁静辽阔，低饱和度，广角远景，细腻噪点控制",
];

/// Look up a model by its public id
pub fn find_model(id: &str) -> Option<&'static ModelDescriptor> {
    MODELS.iter().find(|m| m.id == id)
}
