use std::path::Path;

/// Summary line the agent writes for every source document
const SUMMARY_FORMAT: &str = "Mediante {tipo de documento: Memorando, Oficio o Correo}, Nro. {número}, de fecha {fecha}, se indica que {resumen del contenido}.";

/// Build the instruction text handed to the agent that drafts the report
pub fn build_report_prompt(report_path: &Path, folder_path: &Path) -> String {
    let report_file = report_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| report_path.display().to_string());

    format!(
        r#"INSTRUCCIONES

Ejecuta los pasos siguientes tal como están escritos. No resumas ni reinterpretes estas instrucciones y no agregues comentarios propios.

1. Lee todos los documentos PDF de la carpeta "{folder}" (usa el comando `extract`). Para cada documento escribe un resumen con este formato:

   {summary}

2. Con esos resúmenes prepara el contenido del informe mensual "{report}" como un objeto JSON con las claves:
   - "month": mes del informe en mayúsculas.
   - "activities": descripción de las actividades realizadas, basada en los resúmenes.
   - "titleActivities": lista de objetos {{"actividad": asunto de la actividad, "mes": mes en que ocurrió}}, uno por actividad.
   - "descriptionActivities": lista de objetos {{"actividad": la misma actividad de "titleActivities", "descripcion": resumen corto de lo realizado, "verificador": tipo y número del documento de respaldo (oficio, memorando o correo electrónico)}}.
   - "conclusions": dos párrafos. El primero, de tres a cinco líneas, sintetiza las actividades del mes. El segundo sigue la forma "Durante el mes de {{mes}} del {{año}}, se generaron los siguientes productos: {{lista de productos}}." con informes, ayudas memoria, convenios u otros productos mencionados; si no hay ninguno escribe "no se generaron productos".
   - "recommendations": una recomendación basada en las actividades realizadas.

3. Toma el mes y el año del nombre del archivo "{report_file}" para titular el informe.

4. Guarda el JSON y genera el documento con el comando `report "{report}" --content <archivo.json>`.

Los resúmenes deben ser claros, concisos y fieles al contenido original."#,
        folder = folder_path.display(),
        report = report_path.display(),
        report_file = report_file,
        summary = SUMMARY_FORMAT,
    )
}
