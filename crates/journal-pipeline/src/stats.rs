//! 세션 통계 -- 이번 실행 동안 탐사한 광물별 요약
//!
//! 종료 시 로그로 출력됩니다.

use std::collections::BTreeMap;

use tracing::info;

use edacc_core::types::ProspectedAsteroid;

/// 광물별 누적 통계
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialSummary {
    /// 관측 횟수
    pub count: u64,
    /// 비율 합계 (평균 계산용)
    pub total_proportion: f64,
    /// 최대 비율
    pub max_proportion: f64,
    /// 모선광으로 표시된 횟수
    pub motherlodes: u64,
}

impl MaterialSummary {
    /// 평균 비율
    pub fn mean_proportion(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_proportion / self.count as f64
        }
    }
}

/// 채굴 세션 통계
#[derive(Debug, Clone, Default)]
pub struct MiningStats {
    asteroids: u64,
    materials: BTreeMap<String, MaterialSummary>,
}

impl MiningStats {
    /// 빈 통계를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 탐사한 소행성 하나를 반영합니다.
    pub fn record(&mut self, asteroid: &ProspectedAsteroid) {
        self.asteroids += 1;
        for material in &asteroid.materials {
            let summary = self.materials.entry(material.name.clone()).or_default();
            summary.count += 1;
            summary.total_proportion += material.proportion;
            summary.max_proportion = summary.max_proportion.max(material.proportion);
            if asteroid.motherlode_material.as_deref() == Some(material.name.as_str()) {
                summary.motherlodes += 1;
            }
        }
    }

    /// 탐사한 소행성 수
    pub fn asteroids(&self) -> u64 {
        self.asteroids
    }

    /// 광물 하나의 통계
    pub fn material(&self, name: &str) -> Option<&MaterialSummary> {
        self.materials.get(name)
    }

    /// 요약을 로그로 출력합니다.
    pub fn log_summary(&self) {
        if self.asteroids == 0 {
            info!("no asteroids prospected this session");
            return;
        }
        info!(asteroids = self.asteroids, "mining session summary");
        for (name, summary) in &self.materials {
            info!(
                material = %name,
                count = summary.count,
                mean = summary.mean_proportion(),
                max = summary.max_proportion,
                motherlodes = summary.motherlodes,
                "material summary"
            );
        }
    }
}
