//! Cell Geometry Resolver Module
//!
//! 単語座標ベースの抽出で、セルの矩形に重なる塗りつぶしオブジェクトを探し、
//! その塗りつぶし色を取り出します。セル境界は単語の範囲から近似されるため、
//! 包含ではなく「両軸で空でない交差」を候補条件とします。

use serde::{Deserialize, Serialize};

use crate::types::{BoundingBox, RawColor};

/// ページ上の塗りつぶしオブジェクト（矩形）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillRect {
    pub bbox: BoundingBox,

    /// 塗りつぶし色（線のみの矩形では`None`）
    #[serde(default)]
    pub fill: Option<RawColor>,
}

impl FillRect {
    pub fn new(bbox: BoundingBox, fill: Option<RawColor>) -> Self {
        Self { bbox, fill }
    }
}

/// 1ページ分のセル矩形へ塗りつぶし色を割り当てる
///
/// # 規則
///
/// - 塗りつぶしを持つ矩形ごとに、両軸で重なるセルのうち交差面積が最大のセルへ
///   割り当てる（隣接セルへのはみ出しは無視される）
/// - 1つのセルに複数の矩形が割り当たった場合は、交差面積が最大の矩形の色
/// - 面積が等しい場合はどちらも文書順で最初のもの
///
/// 戻り値は`targets`と同じ順・同じ長さで、割り当てのないセルは`None`（エラーではない）。
pub fn assign_fills<'a>(rects: &'a [FillRect], targets: &[BoundingBox]) -> Vec<Option<&'a RawColor>> {
    let mut awarded: Vec<Option<(f64, &RawColor)>> = vec![None; targets.len()];

    for rect in rects {
        let Some(fill) = rect.fill.as_ref() else {
            continue;
        };

        let mut owner: Option<(usize, f64)> = None;
        for (index, target) in targets.iter().enumerate() {
            if !rect.bbox.overlaps(target) {
                continue;
            }
            let area = rect.bbox.intersection_area(target);
            match owner {
                Some((_, best_area)) if area <= best_area => {}
                _ => owner = Some((index, area)),
            }
        }

        if let Some((index, area)) = owner {
            match awarded[index] {
                // 同面積では先勝ち
                Some((best_area, _)) if area <= best_area => {}
                _ => awarded[index] = Some((area, fill)),
            }
        }
    }

    awarded.into_iter().map(|slot| slot.map(|(_, fill)| fill)).collect()
}

/// 単独のセル矩形に属する塗りつぶし色を解決
///
/// セルが1つだけのページとして[`assign_fills`]を適用します。
pub fn resolve_fill<'a>(rects: &'a [FillRect], target: &BoundingBox) -> Option<&'a RawColor> {
    assign_fills(rects, std::slice::from_ref(target))
        .into_iter()
        .next()
        .flatten()
}
