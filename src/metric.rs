use std::fmt;

use serde::{Deserialize, Serialize};

/// Business metrics a goal slot can track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    Atividade,
    ReaisPorAtivo,
    Faturamento,
    MultimarcasPorAtivo,
    Conversoes,
    Upa,
}

pub const ALL_METRICS: [MetricKey; 6] = [
    MetricKey::Atividade,
    MetricKey::ReaisPorAtivo,
    MetricKey::Faturamento,
    MetricKey::MultimarcasPorAtivo,
    MetricKey::Conversoes,
    MetricKey::Upa,
];

impl MetricKey {
    pub fn display_name(self) -> &'static str {
        match self {
            MetricKey::Atividade => "Atividade",
            MetricKey::ReaisPorAtivo => "Reais por Ativo",
            MetricKey::Faturamento => "Faturamento",
            MetricKey::MultimarcasPorAtivo => "Multimarcas por Ativo",
            MetricKey::Conversoes => "Conversões",
            MetricKey::Upa => "UPA",
        }
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
