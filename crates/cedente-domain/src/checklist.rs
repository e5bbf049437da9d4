// checklist.rs
use serde::{Deserialize, Serialize};

/// Checklist de documentos entregues pelo cedente. Campos ausentes no JSON
/// recebido contam como não entregues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentChecklist {
  pub contrato_social: bool,
  pub cartao_cnpj: bool,
  pub faturamento_12meses: bool,
  pub dre_balanco: bool,
  pub cnh_rg_socios: bool,
  pub ir_socios: bool,
  pub comprovante_endereco: bool,
  pub email: bool,
  pub curva_abc: bool,
  pub dados_bancarios: bool,
}

impl DocumentChecklist {
  pub const ITEMS: [&'static str; 10] = ["contrato_social",
                                         "cartao_cnpj",
                                         "faturamento_12meses",
                                         "dre_balanco",
                                         "cnh_rg_socios",
                                         "ir_socios",
                                         "comprovante_endereco",
                                         "email",
                                         "curva_abc",
                                         "dados_bancarios"];

  pub fn all_delivered() -> Self {
    Self { contrato_social: true,
           cartao_cnpj: true,
           faturamento_12meses: true,
           dre_balanco: true,
           cnh_rg_socios: true,
           ir_socios: true,
           comprovante_endereco: true,
           email: true,
           curva_abc: true,
           dados_bancarios: true }
  }

  fn flags(&self) -> [bool; 10] {
    [self.contrato_social,
     self.cartao_cnpj,
     self.faturamento_12meses,
     self.dre_balanco,
     self.cnh_rg_socios,
     self.ir_socios,
     self.comprovante_endereco,
     self.email,
     self.curva_abc,
     self.dados_bancarios]
  }

  pub fn is_complete(&self) -> bool {
    self.flags().iter().all(|f| *f)
  }

  pub fn completed_count(&self) -> usize {
    self.flags().iter().filter(|f| **f).count()
  }

  /// Itens ainda não entregues, na ordem de `ITEMS`.
  pub fn missing(&self) -> Vec<&'static str> {
    Self::ITEMS.iter().zip(self.flags()).filter(|(_, done)| !done).map(|(name, _)| *name).collect()
  }
}
