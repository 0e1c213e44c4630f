//! Color Classifier Module
//!
//! セルの塗りつぶし色を固定カテゴリ（red / orange / green）へ分類するモジュール。
//!
//! 入力は2種類のバリアントを持ちます:
//!
//! - `RawColor::Token`: 解決済みのシェーディング値（DOCXの`w:fill`など）。大文字小文字を
//!   区別しない完全一致で照合します。
//! - `RawColor::Components`: 近似RGB値（PDFの描画オブジェクトなど）。各チャンネルの差が
//!   許容誤差以内であれば一致とみなします。
//!
//! どちらも一致しない色は「不明」（`None`）であり、推測はしません。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CalendarError;
use crate::types::RawColor;

/// デフォルトの許容誤差（チャンネルごとの絶対差）
pub const DEFAULT_TOLERANCE: u8 = 25;

/// 日のカテゴリ
///
/// 宣言順（red → orange → green）が優先順位です。許容誤差が重なった場合は
/// 先に宣言されたカテゴリが勝ちます。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorCategory {
    Red,
    Orange,
    Green,
}

impl ColorCategory {
    /// 優先順位順のすべてのカテゴリ
    pub const PRIORITY: [ColorCategory; 3] =
        [ColorCategory::Red, ColorCategory::Orange, ColorCategory::Green];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorCategory::Red => "red",
            ColorCategory::Orange => "orange",
            ColorCategory::Green => "green",
        }
    }
}

impl fmt::Display for ColorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorCategory {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "red" => Ok(ColorCategory::Red),
            "orange" => Ok(ColorCategory::Orange),
            "green" => Ok(ColorCategory::Green),
            other => Err(CalendarError::Config(format!(
                "Unknown color category: '{}'",
                other
            ))),
        }
    }
}

/// 1カテゴリ分の色定義（完全一致トークン + 近似RGBターゲット）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySpec {
    pub category: ColorCategory,
    pub token: String,
    pub rgb: [u8; 3],
}

impl CategorySpec {
    /// トークンからRGBターゲットを導出して生成
    ///
    /// トークンが6桁の16進数でない場合は`Config`エラー。
    pub fn from_token(category: ColorCategory, token: &str) -> Result<Self, CalendarError> {
        let rgb = decode_hex_token(token).ok_or_else(|| {
            CalendarError::Config(format!(
                "Token '{}' for category '{}' is not a 6-digit hex color",
                token, category
            ))
        })?;
        Ok(Self {
            category,
            token: normalize_token(token),
            rgb,
        })
    }
}

/// カテゴリ→色の対応表
///
/// 常に優先順位順（red → orange → green）に並びます。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryPalette {
    specs: Vec<CategorySpec>,
}

impl Default for CategoryPalette {
    /// DOCXのシェーディング値と、そこから導出したRGBターゲット
    fn default() -> Self {
        let specs = vec![
            CategorySpec {
                category: ColorCategory::Red,
                token: "FA0701".to_string(),
                rgb: [0xFA, 0x07, 0x01],
            },
            CategorySpec {
                category: ColorCategory::Orange,
                token: "F59A00".to_string(),
                rgb: [0xF5, 0x9A, 0x00],
            },
            CategorySpec {
                category: ColorCategory::Green,
                token: "50A5A0".to_string(),
                rgb: [0x50, 0xA5, 0xA0],
            },
        ];
        Self { specs }
    }
}

impl CategoryPalette {
    /// 対応表を検証して生成
    ///
    /// # 戻り値
    ///
    /// * `Err(CalendarError::Config)` - カテゴリの重複、空トークン、トークンの重複がある場合
    pub fn new(mut specs: Vec<CategorySpec>) -> Result<Self, CalendarError> {
        for spec in &mut specs {
            spec.token = normalize_token(&spec.token);
            if spec.token.is_empty() {
                return Err(CalendarError::Config(format!(
                    "Empty color token for category '{}'",
                    spec.category
                )));
            }
        }

        specs.sort_by_key(|spec| spec.category);
        for pair in specs.windows(2) {
            if pair[0].category == pair[1].category {
                return Err(CalendarError::Config(format!(
                    "Category '{}' is defined more than once",
                    pair[0].category
                )));
            }
        }

        for (i, a) in specs.iter().enumerate() {
            for b in &specs[i + 1..] {
                if a.token == b.token {
                    return Err(CalendarError::Config(format!(
                        "Categories '{}' and '{}' share the token '{}'",
                        a.category, b.category, a.token
                    )));
                }
            }
        }

        Ok(Self { specs })
    }

    pub fn specs(&self) -> &[CategorySpec] {
        &self.specs
    }

    /// トークンとRGBターゲットの整合性を検証
    ///
    /// トークンが16進カラーとして解釈できるカテゴリについて、RGBターゲットが
    /// そのトークンから許容誤差以内にあることを要求します。
    pub fn check_consistency(&self, tolerance: u8) -> Result<(), CalendarError> {
        for spec in &self.specs {
            if let Some(decoded) = decode_hex_token(&spec.token) {
                if !within_tolerance(spec.rgb, decoded, tolerance) {
                    return Err(CalendarError::Config(format!(
                        "Category '{}': rgb target {:?} is not within tolerance {} of token {} {:?}",
                        spec.category, spec.rgb, tolerance, spec.token, decoded
                    )));
                }
            }
        }
        Ok(())
    }
}

/// 色分類器
#[derive(Debug, Clone)]
pub struct ColorClassifier {
    palette: CategoryPalette,
    tolerance: u8,
}

impl Default for ColorClassifier {
    fn default() -> Self {
        Self::new(CategoryPalette::default(), DEFAULT_TOLERANCE)
    }
}

impl ColorClassifier {
    pub fn new(palette: CategoryPalette, tolerance: u8) -> Self {
        Self { palette, tolerance }
    }

    pub fn tolerance(&self) -> u8 {
        self.tolerance
    }

    /// 生の色をカテゴリへ分類
    ///
    /// # 戻り値
    ///
    /// * `Ok(Some(category))` - いずれかのカテゴリに一致した場合
    /// * `Ok(None)` - どのカテゴリにも一致しない場合（不明）
    /// * `Err(CalendarError::InvalidColor)` - RGB入力のチャンネル数または値が不正な場合
    pub fn classify(&self, color: &RawColor) -> Result<Option<ColorCategory>, CalendarError> {
        match color {
            RawColor::Token(token) => Ok(self.classify_token(token)),
            RawColor::Components(channels) => {
                let rgb = parse_components(channels)?;
                Ok(self.classify_rgb(rgb))
            }
        }
    }

    /// 完全一致（大文字小文字のみ区別しない）。最初に一致したカテゴリを返す
    ///
    /// `#`や空白の付いたトークンは一致しません。
    pub fn classify_token(&self, token: &str) -> Option<ColorCategory> {
        let token = token.to_ascii_uppercase();
        self.palette
            .specs
            .iter()
            .find(|spec| spec.token == token)
            .map(|spec| spec.category)
    }

    /// 許容誤差による照合。重なった場合は優先順位の高いカテゴリ
    pub fn classify_rgb(&self, rgb: [u8; 3]) -> Option<ColorCategory> {
        self.palette
            .specs
            .iter()
            .find(|spec| within_tolerance(rgb, spec.rgb, self.tolerance))
            .map(|spec| spec.category)
    }
}

/// 設定・パレット用: `#`を除去し大文字に正規化
fn normalize_token(token: &str) -> String {
    token.trim().trim_start_matches('#').to_ascii_uppercase()
}

/// 6桁の16進トークンをRGBへ変換（例: "F59A00" -> [245, 154, 0]）
pub fn decode_hex_token(token: &str) -> Option<[u8; 3]> {
    let token = normalize_token(token);
    if token.len() != 6 || !token.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&token[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

fn parse_components(channels: &[f64]) -> Result<[u8; 3], CalendarError> {
    if channels.len() != 3 {
        return Err(CalendarError::InvalidColor(format!(
            "expected 3 channels, got {}",
            channels.len()
        )));
    }
    let mut rgb = [0u8; 3];
    for (slot, value) in rgb.iter_mut().zip(channels) {
        if !value.is_finite() || *value < 0.0 || *value > 255.0 {
            return Err(CalendarError::InvalidColor(format!(
                "channel value {} is outside 0-255",
                value
            )));
        }
        *slot = value.round() as u8;
    }
    Ok(rgb)
}

fn within_tolerance(a: [u8; 3], b: [u8; 3], tolerance: u8) -> bool {
    a.iter()
        .zip(b.iter())
        .all(|(x, y)| x.abs_diff(*y) <= tolerance)
}
