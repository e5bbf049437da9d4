// Diesel schema shared by the SQLite and Postgres migrations.
use diesel::allow_tables_to_appear_in_same_query;
diesel::table! {
    cedentes (id) {
        id -> Integer,
        nome_razao_social -> Text,
        cpf_cnpj -> Text,
        status -> Text,
        validade_contrato -> Nullable<Date>,
        observacoes -> Nullable<Text>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}
diesel::table! {
    documentos_cedente (id) {
        id -> Integer,
        cedente_id -> Integer,
        contrato_social -> Bool,
        cartao_cnpj -> Bool,
        faturamento_12meses -> Bool,
        dre_balanco -> Bool,
        cnh_rg_socios -> Bool,
        ir_socios -> Bool,
        comprovante_endereco -> Bool,
        email -> Bool,
        curva_abc -> Bool,
        dados_bancarios -> Bool,
        updated_at -> Timestamp,
    }
}
diesel::table! {
    notificacoes (id) {
        id -> Integer,
        cedente_id -> Nullable<Integer>,
        tipo -> Text,
        titulo -> Text,
        mensagem -> Text,
        lida -> Bool,
        created_at -> Timestamp,
        data_vencimento -> Nullable<Date>,
    }
}
allow_tables_to_appear_in_same_query!(cedentes, documentos_cedente, notificacoes);
