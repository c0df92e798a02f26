/*!

This is the long-form manual for `household_audit` and `census-audit`.

## Input formats

The survey is read from a spreadsheet:
* `xlsx` Excel workbooks, as exported by online forms. The first worksheet is used unless
  a worksheet name is given.
* `csv` Comma Separated Values, with a header row.

The first row holds the column names. Leading and trailing spaces in the names are ignored.
The following columns are required (extra columns are ignored):

| Column | Content |
|--------|---------|
| `Cedula de jefe(a) de Familia` | Document of the head of the family of this person. Equal to `Documento` for the head. |
| `Documento` | Document of the person |
| `Primer Nombre`, `Segundo Nombre`, `Primer Apellido`, `Segundo Apellido` | Names |
| `Parentesco` | Relationship to the head |
| `Tipo de identificación` | Type of document |
| `Sexo` | |
| `Fecha de nacimiento` | |
| `Escolaridad` | Education level |
| `Ocupación` | |
| `Estado civil` | |
| `Dirección`, `Teléfono` | |
| `Hijos nacidos vivos`, `Hijos sobrevivientes` | |
| `Fecha de nacimiento del último hijo nacido vivo` | |
| `Personas fallecidas en el año anterior` | |

Documents are compared as text: the number `1234` and the text `"1234 "` are the same document.

### Old database

The old database used for comparisons needs the columns `FAMILIA`, `NUMERO DOCUMENTO`,
`NOMBRE` and `APELLIDOS`.

## Recoding

The answers for relationship, type of document, sex, education and marital status are
replaced by short codes (for example `Femenino` becomes `F`). The tables are in the
`normalize` module. An answer that is not in a table gets no code: the cell is left empty
in the output, and no error is raised.

## Checks

### Households

The persons are grouped by the head document they declare. In every group:
- if exactly one person is its own head, the group is a household, with one member
  (reported as a head registered alone) or several members;
- if several persons are their own head, a warning lists them;
- if nobody is its own head, a warning is raised for every member.

### Duplicates

Two policies are available:
- `documentAndName` (default): the same full name registered more than once. The count
  is the number of distinct documents for that name.
- `documentOnly`: the same document registered more than once. The count is the number
  of rows for each document, name and family head.

### Comparison with an old database

For every family of the old database, the household of the new survey is the one headed by
the first member of the old family that is a head in the new survey. The members of the
old family that are not in this household are reported as missing. Old families without
any head in the new survey are reported separately.

The total of missing persons is the difference between the number of rows of both files,
as in earlier versions of the reports. The number of members actually flagged is reported
next to it.

*/
