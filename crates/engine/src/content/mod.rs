mod document;

pub use document::{
    document_to_json, export_document, load_document_file, normalize_document,
    parse_document_json, save_document_file, AssociationsRepr, DiagramDocument, DocumentError,
    NormalizationReport, OwnedRoutes, DOCUMENT_VERSION,
};
